//! Value types shared by every stage of the engine

/// Bit matrices for thresholded images and module grids
pub mod matrix;
/// Pixel buffers, luminance grids and colours
pub mod image;
/// Geometric points
pub mod point;
/// Candidate regions handed from detectors to decoders
pub mod region;
/// Scan and generation requests
pub mod request;
/// Scan results and bounding boxes
pub mod result;
/// The symbology catalogue
pub mod symbology;

pub use self::image::{Color, LuminanceGrid, PixelBuffer, PixelFormat};
pub use matrix::{BinaryBitmap, BitMatrix, ModuleMatrix};
pub use point::Point;
pub use region::Region;
pub use request::{DecodeRequest, EncodeRequest, ErrorCorrectionLevel};
pub use result::{BoundingBox, DecodeResult};
pub use symbology::{Symbology, UnknownSymbology};

pub(crate) use region::Locator;
pub(crate) use result::Decoded;
