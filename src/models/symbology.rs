use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Barcode symbology
///
/// Declaration order is the order in which a scan visits requested formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbology {
    /// Code 128 (code sets A, B and C)
    Code128,
    /// Code 39
    Code39,
    /// Code 93
    Code93,
    /// Codabar
    Codabar,
    /// EAN-8
    Ean8,
    /// EAN-13
    Ean13,
    /// UPC-A
    UpcA,
    /// UPC-E
    UpcE,
    /// Interleaved 2 of 5
    Itf,
    /// QR Code (model 2)
    QrCode,
    /// Data Matrix ECC200
    DataMatrix,
    /// PDF417
    Pdf417,
    /// Aztec
    Aztec,
    /// MaxiCode
    MaxiCode,
    /// GS1 DataBar (RSS-14)
    Rss14,
    /// GS1 DataBar Expanded
    RssExpanded,
}

const ALL: [Symbology; 16] = [
    Symbology::Code128,
    Symbology::Code39,
    Symbology::Code93,
    Symbology::Codabar,
    Symbology::Ean8,
    Symbology::Ean13,
    Symbology::UpcA,
    Symbology::UpcE,
    Symbology::Itf,
    Symbology::QrCode,
    Symbology::DataMatrix,
    Symbology::Pdf417,
    Symbology::Aztec,
    Symbology::MaxiCode,
    Symbology::Rss14,
    Symbology::RssExpanded,
];

impl Symbology {
    /// Every catalogued symbology
    pub fn all() -> BTreeSet<Symbology> {
        ALL.into_iter().collect()
    }

    /// Linear (1D) symbologies
    pub fn linear() -> BTreeSet<Symbology> {
        ALL.into_iter().filter(|s| s.is_linear()).collect()
    }

    /// Matrix (2D) symbologies
    pub fn matrix() -> BTreeSet<Symbology> {
        ALL.into_iter().filter(|s| !s.is_linear()).collect()
    }

    /// Symbologies this build can detect, decode and encode
    pub fn supported() -> BTreeSet<Symbology> {
        ALL.into_iter().filter(|s| s.is_supported()).collect()
    }

    /// Whether the symbol is a row of bars rather than a module grid
    pub fn is_linear(self) -> bool {
        matches!(
            self,
            Symbology::Code128
                | Symbology::Code39
                | Symbology::Code93
                | Symbology::Codabar
                | Symbology::Ean8
                | Symbology::Ean13
                | Symbology::UpcA
                | Symbology::UpcE
                | Symbology::Itf
                | Symbology::Rss14
                | Symbology::RssExpanded
        )
    }

    /// Whether this build implements the symbology
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            Symbology::Pdf417 | Symbology::MaxiCode | Symbology::Rss14 | Symbology::RssExpanded
        )
    }

    /// Human readable name
    pub fn display_name(self) -> &'static str {
        match self {
            Symbology::Code128 => "Code 128",
            Symbology::Code39 => "Code 39",
            Symbology::Code93 => "Code 93",
            Symbology::Codabar => "Codabar",
            Symbology::Ean8 => "EAN-8",
            Symbology::Ean13 => "EAN-13",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
            Symbology::Itf => "ITF",
            Symbology::QrCode => "QR Code",
            Symbology::DataMatrix => "Data Matrix",
            Symbology::Pdf417 => "PDF417",
            Symbology::Aztec => "Aztec",
            Symbology::MaxiCode => "MaxiCode",
            Symbology::Rss14 => "RSS-14",
            Symbology::RssExpanded => "RSS Expanded",
        }
    }

    /// Canonical upper-snake identifier, as accepted by [`FromStr`]
    pub fn key(self) -> &'static str {
        match self {
            Symbology::Code128 => "CODE_128",
            Symbology::Code39 => "CODE_39",
            Symbology::Code93 => "CODE_93",
            Symbology::Codabar => "CODABAR",
            Symbology::Ean8 => "EAN_8",
            Symbology::Ean13 => "EAN_13",
            Symbology::UpcA => "UPC_A",
            Symbology::UpcE => "UPC_E",
            Symbology::Itf => "ITF",
            Symbology::QrCode => "QR_CODE",
            Symbology::DataMatrix => "DATA_MATRIX",
            Symbology::Pdf417 => "PDF_417",
            Symbology::Aztec => "AZTEC",
            Symbology::MaxiCode => "MAXICODE",
            Symbology::Rss14 => "RSS_14",
            Symbology::RssExpanded => "RSS_EXPANDED",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when parsing an unknown symbology name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown symbology '{0}'")]
pub struct UnknownSymbology(pub String);

impl FromStr for Symbology {
    type Err = UnknownSymbology;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_uppercase())
            .collect();
        ALL.into_iter()
            .find(|sym| sym.key().replace('_', "") == normalized)
            .ok_or_else(|| UnknownSymbology(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition() {
        let linear = Symbology::linear();
        let matrix = Symbology::matrix();
        assert_eq!(linear.len() + matrix.len(), Symbology::all().len());
        assert!(linear.contains(&Symbology::Rss14));
        assert!(matrix.contains(&Symbology::Aztec));
        assert!(linear.is_disjoint(&matrix));
    }

    #[test]
    fn test_supported_excludes_table_driven_formats() {
        let supported = Symbology::supported();
        assert!(supported.contains(&Symbology::QrCode));
        assert!(!supported.contains(&Symbology::Pdf417));
        assert!(!supported.contains(&Symbology::MaxiCode));
    }

    #[test]
    fn test_parse() {
        assert_eq!("UPC_A".parse::<Symbology>(), Ok(Symbology::UpcA));
        assert_eq!("qr-code".parse::<Symbology>(), Ok(Symbology::QrCode));
        assert_eq!("code128".parse::<Symbology>(), Ok(Symbology::Code128));
        assert!("bogus".parse::<Symbology>().is_err());
        assert_eq!(Symbology::Pdf417.to_string(), "PDF417");
    }
}
