//! Page setup for emitted PDF documents.
//!
//! Letters print on US Letter paper with 0.75in top/bottom and 1in left/right margins and
//! with background graphics. Callers adjust this per render through [`PdfOverrides`], which
//! is merged field by field over [`PdfOptions::default`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PX_PER_INCH: f64 = 96.0;
const PT_PER_INCH: f64 = 72.0;
const CM_PER_INCH: f64 = 2.54;
const MM_PER_INCH: f64 = 25.4;

/// Named paper sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperFormat {
    #[default]
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl PaperFormat {
    /// Portrait width and height in inches.
    pub fn size_in_inches(&self) -> (f64, f64) {
        match self {
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
            PaperFormat::Ledger => (17.0, 11.0),
            PaperFormat::A0 => (33.1, 46.8),
            PaperFormat::A1 => (23.4, 33.1),
            PaperFormat::A2 => (16.54, 23.4),
            PaperFormat::A3 => (11.7, 16.54),
            PaperFormat::A4 => (8.27, 11.7),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::A6 => (4.13, 5.83),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageSetupError {
    #[error("unknown paper format: {0}")]
    UnknownFormat(String),
    #[error("invalid length: {0}")]
    InvalidLength(String),
}

impl FromStr for PaperFormat {
    type Err = PageSetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "letter" => PaperFormat::Letter,
            "legal" => PaperFormat::Legal,
            "tabloid" => PaperFormat::Tabloid,
            "ledger" => PaperFormat::Ledger,
            "a0" => PaperFormat::A0,
            "a1" => PaperFormat::A1,
            "a2" => PaperFormat::A2,
            "a3" => PaperFormat::A3,
            "a4" => PaperFormat::A4,
            "a5" => PaperFormat::A5,
            "a6" => PaperFormat::A6,
            _ => return Err(PageSetupError::UnknownFormat(s.to_owned())),
        };
        Ok(format)
    }
}

/// A physical length, stored in inches.
///
/// Parses CSS-style strings (`"0.75in"`, `"2cm"`, `"20mm"`, `"96px"`, `"72pt"`); bare
/// numbers are pixels.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "String")]
pub struct PageLength(f64);

impl PageLength {
    pub fn inches(value: f64) -> Self {
        Self(value)
    }

    pub fn as_inches(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for PageLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}in", self.0)
    }
}

impl From<PageLength> for String {
    fn from(length: PageLength) -> Self {
        length.to_string()
    }
}

impl FromStr for PageLength {
    type Err = PageSetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| PageSetupError::InvalidLength(s.to_owned()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(PageSetupError::InvalidLength(s.to_owned()));
        }

        let inches = match unit {
            "in" => value,
            "cm" => value / CM_PER_INCH,
            "mm" => value / MM_PER_INCH,
            "pt" => value / PT_PER_INCH,
            "px" | "" => value / PX_PER_INCH,
            _ => return Err(PageSetupError::InvalidLength(s.to_owned())),
        };
        Ok(Self(inches))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Pixels(f64),
    Css(String),
}

impl TryFrom<LengthRepr> for PageLength {
    type Error = PageSetupError;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Pixels(px) if px.is_finite() && px >= 0.0 => Ok(Self(px / PX_PER_INCH)),
            LengthRepr::Pixels(px) => Err(PageSetupError::InvalidLength(px.to_string())),
            LengthRepr::Css(s) => s.parse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: PageLength,
    pub right: PageLength,
    pub bottom: PageLength,
    pub left: PageLength,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: PageLength::inches(0.75),
            right: PageLength::inches(1.0),
            bottom: PageLength::inches(0.75),
            left: PageLength::inches(1.0),
        }
    }
}

/// Partial margin override; unset sides keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginOverrides {
    pub top: Option<PageLength>,
    pub right: Option<PageLength>,
    pub bottom: Option<PageLength>,
    pub left: Option<PageLength>,
}

/// Fully resolved page setup handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub format: PaperFormat,
    /// Explicit paper width, taking precedence over `format`.
    pub width: Option<PageLength>,
    /// Explicit paper height, taking precedence over `format`.
    pub height: Option<PageLength>,
    pub margin: Margins,
    pub print_background: bool,
    pub landscape: bool,
    pub scale: f64,
    pub prefer_css_page_size: bool,
    /// Page ranges to print, e.g. `"1"` or `"1-3, 5"`.
    pub page_ranges: Option<String>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: PaperFormat::Letter,
            width: None,
            height: None,
            margin: Margins::default(),
            print_background: true,
            landscape: false,
            scale: 1.0,
            prefer_css_page_size: false,
            page_ranges: None,
        }
    }
}

impl PdfOptions {
    /// Applies `overrides` on top of these options.
    pub fn merged(mut self, overrides: &PdfOverrides) -> Self {
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if overrides.width.is_some() {
            self.width = overrides.width;
        }
        if overrides.height.is_some() {
            self.height = overrides.height;
        }
        if let Some(margin) = &overrides.margin {
            let m = &mut self.margin;
            m.top = margin.top.unwrap_or(m.top);
            m.right = margin.right.unwrap_or(m.right);
            m.bottom = margin.bottom.unwrap_or(m.bottom);
            m.left = margin.left.unwrap_or(m.left);
        }
        if let Some(print_background) = overrides.print_background {
            self.print_background = print_background;
        }
        if let Some(landscape) = overrides.landscape {
            self.landscape = landscape;
        }
        if let Some(scale) = overrides.scale {
            self.scale = scale;
        }
        if let Some(prefer) = overrides.prefer_css_page_size {
            self.prefer_css_page_size = prefer;
        }
        if overrides.page_ranges.is_some() {
            self.page_ranges = overrides.page_ranges.clone();
        }
        self
    }

    /// Paper width and height in inches, before any landscape rotation.
    pub fn paper_size_in_inches(&self) -> (f64, f64) {
        let (width, height) = self.format.size_in_inches();
        (
            self.width.map_or(width, |w| w.as_inches()),
            self.height.map_or(height, |h| h.as_inches()),
        )
    }
}

/// Per-call page setup overrides. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfOverrides {
    pub format: Option<PaperFormat>,
    pub width: Option<PageLength>,
    pub height: Option<PageLength>,
    pub margin: Option<MarginOverrides>,
    pub print_background: Option<bool>,
    pub landscape: Option<bool>,
    pub scale: Option<f64>,
    #[serde(rename = "preferCSSPageSize")]
    pub prefer_css_page_size: Option<bool>,
    pub page_ranges: Option<String>,
}
