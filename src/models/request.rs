use super::{Color, Symbology};
use crate::config;
use std::collections::BTreeSet;
use std::time::Duration;

/// What to look for and how hard to try
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    /// Candidate symbologies, visited in [`Symbology`] order
    pub formats: BTreeSet<Symbology>,
    /// Scan every row, rotated images and a second binarizer
    pub try_harder: bool,
    /// The image is a single unrotated symbol on a plain background
    pub pure_barcode: bool,
    /// Total budget for detector and decoder attempts
    pub timeout: Duration,
}

impl Default for DecodeRequest {
    fn default() -> Self {
        Self {
            formats: Symbology::supported(),
            try_harder: false,
            pure_barcode: false,
            timeout: config::default_scan_timeout(),
        }
    }
}

impl DecodeRequest {
    /// Look for any supported symbology with default tuning
    pub fn new() -> Self {
        Self::default()
    }

    /// Short budget for live camera frames
    pub fn fast() -> Self {
        Self {
            try_harder: false,
            timeout: Duration::from_millis(1000),
            ..Self::default()
        }
    }

    /// Thorough search with a long budget
    pub fn accurate() -> Self {
        Self {
            try_harder: true,
            timeout: Duration::from_millis(10_000),
            ..Self::default()
        }
    }

    /// Restrict the scan to the given symbologies
    pub fn with_formats<I: IntoIterator<Item = Symbology>>(mut self, formats: I) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    /// Restrict the scan to one symbology
    pub fn with_format(self, format: Symbology) -> Self {
        self.with_formats([format])
    }

    /// Toggle thorough search
    pub fn try_harder(mut self, enabled: bool) -> Self {
        self.try_harder = enabled;
        self
    }

    /// Toggle the pure-symbol fast path
    pub fn pure_barcode(mut self, enabled: bool) -> Self {
        self.pure_barcode = enabled;
        self
    }

    /// Replace the time budget
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Error-correction strength for matrix symbologies that offer a choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ErrorCorrectionLevel {
    /// About 7% recovery capacity
    Low,
    /// About 15% recovery capacity
    #[default]
    Medium,
    /// About 25% recovery capacity
    Quartile,
    /// About 30% recovery capacity
    High,
}

/// Everything needed to render one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    /// Text payload
    pub text: String,
    /// Target symbology
    pub symbology: Symbology,
    /// Minimum output width in pixels
    pub width: usize,
    /// Minimum output height in pixels
    pub height: usize,
    /// Quiet zone on each side, in modules
    pub margin: usize,
    /// Colour of dark modules
    pub foreground: Color,
    /// Colour of light modules and the quiet zone
    pub background: Color,
    /// Error-correction level where the symbology supports one
    pub ec_level: ErrorCorrectionLevel,
}

impl EncodeRequest {
    /// Request with the default geometry and colours
    pub fn new(text: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            text: text.into(),
            symbology,
            width: 300,
            height: 300,
            margin: 1,
            foreground: Color::BLACK,
            background: Color::WHITE,
            ec_level: ErrorCorrectionLevel::Medium,
        }
    }

    /// Larger output with the strongest error correction
    pub fn high_quality(text: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            width: 600,
            height: 600,
            ec_level: ErrorCorrectionLevel::High,
            ..Self::new(text, symbology)
        }
    }

    /// Set the output size
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the quiet zone in modules
    pub fn margin(mut self, margin: usize) -> Self {
        self.margin = margin;
        self
    }

    /// Set both colours
    pub fn colors(mut self, foreground: Color, background: Color) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }

    /// Set the error-correction level
    pub fn ec_level(mut self, level: ErrorCorrectionLevel) -> Self {
        self.ec_level = level;
        self
    }
}
