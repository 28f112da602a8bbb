//! Error types for the zebra engine.
//!
//! Hard failures (malformed input, impossible requests) travel as [`ZebraError`] in
//! `Result::Err`. Expected negative outcomes of a scan are values of
//! [`DecodeResult`](crate::DecodeResult) instead.

use crate::models::Symbology;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for zebra operations
pub type Result<T> = std::result::Result<T, ZebraError>;

/// Error taxonomy shared by scanning and generation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ZebraError {
    /// Pixel buffer dimensions and byte length disagree
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    /// Luminance grid has zero area
    #[error("cannot binarize a zero-area luminance grid")]
    Binarization,

    /// Decode request names no symbology
    #[error("decode request must name at least one symbology")]
    EmptyRequest,

    /// Symbol located but its check character does not match
    #[error("{0} symbol located but its checksum does not match")]
    Checksum(Symbology),

    /// Symbol located but damage exceeds the error-correction capacity
    #[error("{0} symbol located but damage exceeds its error-correction capacity")]
    ErrorCorrection(Symbology),

    /// Symbol located and corrected but its codewords do not form a valid message
    #[error("{symbology} symbol located but its payload is malformed: {reason}")]
    MalformedSymbol {
        /// Symbology of the located symbol
        symbology: Symbology,
        /// What was wrong with the codeword stream
        reason: String,
    },

    /// Text cannot be represented in the requested symbology
    #[error("payload not encodable as {symbology}: {reason}")]
    InvalidPayload {
        /// Target symbology
        symbology: Symbology,
        /// Which rule the payload broke
        reason: String,
    },

    /// Symbology is catalogued but not implemented by this build
    #[error("{0} is not supported by this build")]
    UnsupportedSymbology(Symbology),

    /// Scan budget expired before every candidate was tried
    #[error("scan gave up after {0:?}")]
    Timeout(Duration),

    /// Caller abandoned the scan
    #[error("scan was cancelled")]
    Cancelled,
}

impl ZebraError {
    pub(crate) fn invalid_payload(symbology: Symbology, reason: impl Into<String>) -> Self {
        ZebraError::InvalidPayload {
            symbology,
            reason: reason.into(),
        }
    }
}

/// Why a decoder rejected one candidate region
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum DecodeFailure {
    /// Region does not hold this symbology after all
    #[error("no symbol at region")]
    NotFound,
    /// Structurally complete symbol whose check character is wrong
    #[error("checksum mismatch")]
    Checksum,
    /// Reed-Solomon correction failed
    #[error("too many codeword errors")]
    ErrorCorrection,
    /// Corrected codewords violate the symbology's message grammar
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl DecodeFailure {
    /// Whether the failure proves a damaged symbol is present
    pub(crate) fn is_corrupt_symbol(&self) -> bool {
        !matches!(self, DecodeFailure::NotFound)
    }

    pub(crate) fn into_error(self, symbology: Symbology) -> ZebraError {
        match self {
            DecodeFailure::Checksum => ZebraError::Checksum(symbology),
            DecodeFailure::ErrorCorrection => ZebraError::ErrorCorrection(symbology),
            DecodeFailure::Malformed(reason) => ZebraError::MalformedSymbol { symbology, reason },
            DecodeFailure::NotFound => ZebraError::MalformedSymbol {
                symbology,
                reason: "symbol vanished on decode".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ZebraError::invalid_payload(Symbology::UpcA, "expected 12 digits");
        assert_eq!(
            err.to_string(),
            "payload not encodable as UPC-A: expected 12 digits"
        );
        assert_eq!(
            ZebraError::UnsupportedSymbology(Symbology::Pdf417).to_string(),
            "PDF417 is not supported by this build"
        );
    }

    #[test]
    fn test_failure_classification() {
        assert!(!DecodeFailure::NotFound.is_corrupt_symbol());
        assert!(DecodeFailure::ErrorCorrection.is_corrupt_symbol());
        assert_eq!(
            DecodeFailure::Checksum.into_error(Symbology::Ean13),
            ZebraError::Checksum(Symbology::Ean13)
        );
    }
}
