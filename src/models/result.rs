use super::{Point, Symbology};
use crate::error::ZebraError;

/// Axis-aligned rectangle in source-image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoundingBox {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width, never negative
    pub width: i32,
    /// Height, never negative
    pub height: i32,
}

impl BoundingBox {
    /// Smallest box containing every point
    pub fn enclosing(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let min_x = points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_x = points.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let max_y = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        let x = min_x.floor() as i32;
        let y = min_y.floor() as i32;
        Self {
            x,
            y,
            width: (max_x.ceil() as i32 - x).max(0),
            height: (max_y.ceil() as i32 - y).max(0),
        }
    }

    /// Whether pixel (px, py) lies inside the box; the right and bottom edges are exclusive
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.width && py < self.y + self.height
    }
}

/// Outcome of a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A symbol was located and decoded
    Success {
        /// Decoded text
        text: String,
        /// Symbology of the decoded symbol
        symbology: Symbology,
        /// Payload bytes before character decoding, where the symbology carries bytes
        raw: Option<Vec<u8>>,
        /// Where the symbol sits in the image
        bounding_box: BoundingBox,
    },
    /// No requested symbology was found
    NotFound,
    /// A symbol was found but could not be read, or the scan gave up
    Error {
        /// Human readable summary
        message: String,
        /// Structured cause
        cause: Option<ZebraError>,
    },
}

impl DecodeResult {
    pub(crate) fn from_error(err: ZebraError) -> Self {
        DecodeResult::Error {
            message: err.to_string(),
            cause: Some(err),
        }
    }

    /// Whether the scan produced text
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeResult::Success { .. })
    }

    /// Decoded text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            DecodeResult::Success { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Symbology of the decoded symbol, if any
    pub fn symbology(&self) -> Option<Symbology> {
        match self {
            DecodeResult::Success { symbology, .. } => Some(*symbology),
            _ => None,
        }
    }
}

/// Decoder output before it is packaged into a [`DecodeResult`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Decoded {
    pub text: String,
    pub symbology: Symbology,
    pub raw: Option<Vec<u8>>,
    pub corners: Vec<Point>,
}

impl Decoded {
    pub(crate) fn new(text: String, symbology: Symbology, corners: Vec<Point>) -> Self {
        Self {
            text,
            symbology,
            raw: None,
            corners,
        }
    }

    pub(crate) fn with_raw(mut self, raw: Vec<u8>) -> Self {
        self.raw = Some(raw);
        self
    }

    pub(crate) fn into_result(self) -> DecodeResult {
        DecodeResult::Success {
            bounding_box: BoundingBox::enclosing(&self.corners),
            text: self.text,
            symbology: self.symbology,
            raw: self.raw,
        }
    }
}
