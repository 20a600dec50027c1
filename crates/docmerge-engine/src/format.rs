use std::fmt;

use crate::model::Run;

/// Font size stored in half points, the unit word processors use on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontSize(u32);

impl FontSize {
    pub fn from_half_points(half_points: u32) -> Self {
        Self(half_points)
    }

    pub fn from_points(points: u32) -> Self {
        Self(points * 2)
    }

    pub fn half_points(self) -> u32 {
        self.0
    }

    pub fn points(self) -> f32 {
        self.0 as f32 / 2.0
    }
}

/// The formatting attributes carried by a run.
///
/// Every attribute is tri-state: `None` means the run inherits the value
/// from its paragraph or style, which is distinct from an explicit
/// "off". A snapshot taken from one run and stamped onto another must
/// keep unset attributes unset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Format {
    pub font_name: Option<String>,
    pub font_size: Option<FontSize>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Underline style name (`single`, `double`, `none`, ...).
    pub underline: Option<String>,
    /// Hex RGB without the leading `#`, or `auto`.
    pub color: Option<String>,
    /// Highlight color name (`yellow`, `green`, ...).
    pub highlight: Option<String>,
}

impl Format {
    /// Captures the format of `run` verbatim.
    pub fn snapshot(run: &Run) -> Self {
        run.format.clone()
    }

    /// True when no attribute is set, i.e. everything is inherited.
    pub fn is_inherited(&self) -> bool {
        *self == Format::default()
    }

    pub fn with_font(mut self, name: impl Into<String>) -> Self {
        self.font_name = Some(name.into());
        self
    }

    pub fn with_size(mut self, size: FontSize) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    pub fn with_underline(mut self, style: impl Into<String>) -> Self {
        self.underline = Some(style.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_highlight(mut self, highlight: impl Into<String>) -> Self {
        self.highlight = Some(highlight.into());
        self
    }
}

/// Compact listing of the attributes that are set, e.g. `{bold,size=12pt}`.
impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(name) = &self.font_name {
            parts.push(format!("font={name}"));
        }
        if let Some(size) = self.font_size {
            parts.push(format!("size={}pt", size.points()));
        }
        if let Some(bold) = self.bold {
            parts.push(if bold { "bold" } else { "!bold" }.to_string());
        }
        if let Some(italic) = self.italic {
            parts.push(if italic { "italic" } else { "!italic" }.to_string());
        }
        if let Some(style) = &self.underline {
            parts.push(format!("underline={style}"));
        }
        if let Some(color) = &self.color {
            parts.push(format!("color={color}"));
        }
        if let Some(highlight) = &self.highlight {
            parts.push(format!("highlight={highlight}"));
        }
        write!(f, "{{{}}}", parts.join(","))
    }
}
