//! Capability registry: one detector, decoder and encoder per supported symbology.
//!
//! The scan orchestrator and the generator only ever talk to [`CodecEntry`] values
//! looked up here, so adding a symbology means adding one entry to [`Registry::build`].

use crate::aztec::AztecCodec;
use crate::datamatrix::DataMatrixCodec;
use crate::error::{DecodeFailure, Result};
use crate::linear::{
    Codabar, Code39, Code93, Code128, Ean8, Ean13, Itf, LinearCodec, UpcA, UpcE,
};
use crate::models::{BitMatrix, DecodeRequest, Decoded, ErrorCorrectionLevel, Region, Symbology};
use crate::qr::QrCodec;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Thresholded image plus lazily derived views shared by every detector of one scan
pub(crate) struct ScanImage {
    bitmap: BitMatrix,
    rotated: OnceLock<BitMatrix>,
}

impl ScanImage {
    pub(crate) fn new(bitmap: BitMatrix) -> Self {
        Self {
            bitmap,
            rotated: OnceLock::new(),
        }
    }

    pub(crate) fn bitmap(&self) -> &BitMatrix {
        &self.bitmap
    }

    /// The bitmap turned a quarter turn clockwise
    pub(crate) fn rotated(&self) -> &BitMatrix {
        self.rotated.get_or_init(|| self.bitmap.rotate_90())
    }

    pub(crate) fn height(&self) -> usize {
        self.bitmap.height()
    }
}

/// Finds candidate regions of one symbology
pub(crate) trait Detect: Send + Sync {
    fn detect(&self, image: &ScanImage, request: &DecodeRequest) -> Vec<Region>;
}

/// Reads the symbol at one candidate region
pub(crate) trait Decode: Send + Sync {
    fn decode(
        &self,
        image: &ScanImage,
        region: &Region,
        request: &DecodeRequest,
    ) -> std::result::Result<Decoded, DecodeFailure>;
}

/// Turns a payload into modules; linear symbologies produce a single row
pub(crate) trait Encode: Send + Sync {
    fn encode(&self, text: &str, level: ErrorCorrectionLevel) -> Result<BitMatrix>;
}

/// Everything the engine knows how to do with one symbology
#[derive(Clone)]
pub(crate) struct CodecEntry {
    pub symbology: Symbology,
    pub detector: Arc<dyn Detect>,
    pub decoder: Arc<dyn Decode>,
    pub encoder: Arc<dyn Encode>,
    /// Corrupt candidates needed before a failed format is reported as an error
    pub min_corrupt_hits: usize,
}

impl fmt::Debug for CodecEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecEntry")
            .field("symbology", &self.symbology)
            .field("min_corrupt_hits", &self.min_corrupt_hits)
            .finish_non_exhaustive()
    }
}

impl CodecEntry {
    fn new<C>(symbology: Symbology, codec: C) -> Self
    where
        C: Detect + Decode + Encode + 'static,
    {
        let codec = Arc::new(codec);
        Self {
            symbology,
            detector: codec.clone(),
            decoder: codec.clone(),
            encoder: codec,
            min_corrupt_hits: if symbology.is_linear() { 2 } else { 1 },
        }
    }
}

/// Lookup table from symbology to codec
pub(crate) struct Registry {
    entries: BTreeMap<Symbology, CodecEntry>,
}

impl Registry {
    fn build() -> Self {
        let entries = [
            CodecEntry::new(Symbology::Code128, LinearCodec(Code128)),
            CodecEntry::new(Symbology::Code39, LinearCodec(Code39)),
            CodecEntry::new(Symbology::Code93, LinearCodec(Code93)),
            CodecEntry::new(Symbology::Codabar, LinearCodec(Codabar)),
            CodecEntry::new(Symbology::Ean8, LinearCodec(Ean8)),
            CodecEntry::new(Symbology::Ean13, LinearCodec(Ean13)),
            CodecEntry::new(Symbology::UpcA, LinearCodec(UpcA)),
            CodecEntry::new(Symbology::UpcE, LinearCodec(UpcE)),
            CodecEntry::new(Symbology::Itf, LinearCodec(Itf)),
            CodecEntry::new(Symbology::QrCode, QrCodec),
            CodecEntry::new(Symbology::DataMatrix, DataMatrixCodec),
            CodecEntry::new(Symbology::Aztec, AztecCodec),
        ];
        Self {
            entries: entries.into_iter().map(|e| (e.symbology, e)).collect(),
        }
    }

    /// Process-wide registry
    pub(crate) fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    pub(crate) fn get(&self, symbology: Symbology) -> Option<&CodecEntry> {
        self.entries.get(&symbology)
    }

    /// Registered symbologies in scan order
    #[cfg(test)]
    pub(crate) fn symbologies(&self) -> impl Iterator<Item = Symbology> + '_ {
        self.entries.keys().copied()
    }
}
