//! Packs many generated documents into one zip archive.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::IoError;

/// Zip `(file name, content)` pairs in the order given.
///
/// Names are used as-is; callers make them unique first.
pub fn write_zip<'a, I>(entries: I) -> Result<Vec<u8>, IoError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut count = 0;
    for (name, content) in entries {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(name, options)?;
        writer.write_all(content)?;
        count += 1;
    }
    let bytes = writer.finish()?.into_inner();
    log::debug!("Packed {count} files into {} bytes", bytes.len());
    Ok(bytes)
}
