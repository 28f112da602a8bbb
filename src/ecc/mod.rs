//! Error correction shared by the matrix symbologies
//!
//! - `galois`: GF(2^m) arithmetic and the fields each symbology uses
//! - `reed_solomon`: systematic encoding and Berlekamp-Massey decoding

pub mod galois;
pub mod reed_solomon;

pub use galois::GaloisField;
pub use reed_solomon::{ReedSolomonDecoder, ReedSolomonEncoder, ReedSolomonError};
