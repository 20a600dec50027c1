use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use docmerge_config::Config;
use docmerge_engine::io::{archive, records, write_bytes};
use docmerge_engine::naming::UniqueNames;
use docmerge_engine::scan::marker;
use docmerge_engine::{DocxTemplate, MergeOptions, MergeReport, Merger, Record, WalkOptions};
use std::path::{Path, PathBuf};

const OUTPUT_EXTENSION: &str = "docx";

#[derive(Debug, Parser)]
#[command(name = "docmerge", version, about = "Fill {{placeholders}} in a .docx template from CSV or spreadsheet rows")]
struct Cli {
    /// Config file to use instead of ~/.config/docmerge/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Produce one document per record
    Generate(GenerateArgs),
    /// Show what a template contains
    Inspect {
        #[arg(long)]
        template: PathBuf,
    },
    /// Show how the first record maps onto the template's placeholders
    Preview {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        template: PathBuf,
    },
    /// Write a config file with the default settings
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(long)]
    template: PathBuf,

    /// CSV, XLSX, XLS or ODS file; the first row names the fields
    #[arg(long)]
    data: PathBuf,

    /// Output directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Only substitute these fields
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Field used to name outputs; repeat to give fallbacks
    #[arg(long = "name-key")]
    name_keys: Vec<String>,

    /// Never rewrite whole table cells
    #[arg(long)]
    no_cell_fallback: bool,

    /// Write every document separately instead of one archive
    #[arg(long)]
    loose: bool,
}

impl GenerateArgs {
    /// Command-line flags win over the config file.
    fn merge_options(&self, config: &Config) -> MergeOptions {
        let name_keys = if self.name_keys.is_empty() {
            config.name_keys.clone()
        } else {
            self.name_keys.clone()
        };
        MergeOptions {
            name_keys,
            columns: self.columns.clone().or_else(|| config.columns.clone()),
            walk: WalkOptions {
                cell_fallback: config.cell_fallback && !self.no_cell_fallback,
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    log::debug!("Config path: {}", config_path.display());

    match cli.command {
        Command::Generate(args) => {
            let config = Config::load_or_default(Some(config_path.as_path()))
                .context("Failed to load config")?;
            generate(&args, &config)
        }
        Command::Inspect { template } => inspect(&template),
        Command::Preview { data, template } => preview(&data, &template),
        Command::InitConfig { force } => init_config(&config_path, force),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_template(path: &Path) -> Result<DocxTemplate> {
    DocxTemplate::open(path).with_context(|| format!("Failed to load template {}", path.display()))
}

fn load_records(path: &Path) -> Result<Vec<Record>> {
    records::read_records(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))
}

fn generate(args: &GenerateArgs, config: &Config) -> Result<()> {
    let template = load_template(&args.template)?;
    let records = load_records(&args.data)?;
    if records.is_empty() {
        bail!("No records in {}", args.data.display());
    }
    let total = records.len();

    let merger = Merger::new(&template, args.merge_options(config));
    let report = run(&merger, records);

    let mut names = UniqueNames::new();
    let mut outputs = Vec::new();
    let mut failed = report.failed();
    for generated in report.generated() {
        match template.render(&generated.document) {
            Ok(bytes) => outputs.push((names.claim(&generated.name, OUTPUT_EXTENSION), bytes)),
            Err(e) => {
                log::warn!("Record {} failed: {e}", generated.index + 1);
                failed += 1;
            }
        }
    }
    if outputs.is_empty() {
        bail!("All {total} records failed");
    }

    let out_dir = args.out.as_deref().unwrap_or(config.output_dir.as_path());
    if outputs.len() == 1 || args.loose {
        for (name, bytes) in &outputs {
            let path = out_dir.join(name);
            write_bytes(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
    } else {
        let bytes = archive::write_zip(
            outputs
                .iter()
                .map(|(name, bytes)| (name.as_str(), bytes.as_slice())),
        )?;
        let path = out_dir.join(&config.archive_name);
        write_bytes(&path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {} documents to {}", outputs.len(), path.display());
    }

    println!("Generated {} of {total} documents", outputs.len());
    if failed > 0 {
        println!("{failed} records failed, see the log above");
    }
    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn run(merger: &Merger<'_, DocxTemplate>, records: Vec<Record>) -> MergeReport {
    merger.run(records)
}

#[cfg(feature = "parallel")]
fn run(merger: &Merger<'_, DocxTemplate>, records: Vec<Record>) -> MergeReport {
    merger.run_parallel(&records)
}

fn inspect(path: &Path) -> Result<()> {
    let summary = load_template(path)?.summary();
    println!("Paragraphs: {}", summary.paragraphs);
    println!("Tables: {}", summary.tables);
    if summary.placeholders.is_empty() {
        println!("Placeholders: none");
    } else {
        println!("Placeholders:");
        for name in &summary.placeholders {
            println!("  {}", marker(name));
        }
    }
    Ok(())
}

fn preview(data: &Path, template: &Path) -> Result<()> {
    let placeholders = load_template(template)?.summary().placeholders;
    let records = load_records(data)?;
    let Some(first) = records.first() else {
        bail!("No records in {}", data.display());
    };
    for line in preview_lines(first, &placeholders) {
        println!("{line}");
    }
    Ok(())
}

/// One line per field of `record`, then one per template placeholder no
/// field fills.
fn preview_lines(
    record: &Record,
    placeholders: &std::collections::BTreeSet<String>,
) -> Vec<String> {
    let mut lines: Vec<String> = record
        .iter()
        .map(|(key, value)| {
            let unused = if placeholders.contains(key) {
                ""
            } else {
                "  (not in template)"
            };
            format!("{} → {value}{unused}", marker(key))
        })
        .collect();
    lines.extend(
        placeholders
            .iter()
            .filter(|name| record.get(name).is_none())
            .map(|name| format!("{} → (no column)", marker(name))),
    );
    lines
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to replace it",
            path.display()
        );
    }
    Config::default().save_to_path(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
