//! Aztec character modes and their code tables.

/// The five character modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Upper,
    Lower,
    Mixed,
    Punct,
    Digit,
}

/// Meaning of one code in one mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Code {
    Char(u8),
    Pair(&'static [u8; 2]),
    Latch(Mode),
    Shift(Mode),
    BinaryShift,
    /// FLG(n): FNC1 or an ECI designator
    Flag,
}

const MIXED_SYMBOLS: &[u8; 7] = b"@\\^_`|~";
const PUNCT_SYMBOLS: &[u8; 25] = b"!\"#$%&'()*+,-./:;<=>?[]{}";
const PUNCT_PAIRS: [&[u8; 2]; 4] = [b"\r\n", b". ", b", ", b": "];

impl Mode {
    /// Bits per code
    pub(crate) fn code_bits(self) -> usize {
        match self {
            Mode::Digit => 4,
            _ => 5,
        }
    }

    pub(crate) fn lookup(self, code: u32) -> Code {
        match (self, code) {
            (Mode::Punct, 0) => Code::Flag,
            (_, 0) => Code::Shift(Mode::Punct),
            (Mode::Punct, 1) => Code::Char(b'\r'),
            (_, 1) => Code::Char(b' '),
            (Mode::Upper, 2..=27) => Code::Char(b'A' + (code - 2) as u8),
            (Mode::Upper, 28) => Code::Latch(Mode::Lower),
            (Mode::Upper, 29) => Code::Latch(Mode::Mixed),
            (Mode::Upper, 30) => Code::Latch(Mode::Digit),
            (Mode::Lower, 2..=27) => Code::Char(b'a' + (code - 2) as u8),
            (Mode::Lower, 28) => Code::Shift(Mode::Upper),
            (Mode::Lower, 29) => Code::Latch(Mode::Mixed),
            (Mode::Lower, 30) => Code::Latch(Mode::Digit),
            (Mode::Mixed, 2..=14) => Code::Char((code - 1) as u8),
            (Mode::Mixed, 15..=19) => Code::Char((code - 15 + 27) as u8),
            (Mode::Mixed, 20..=26) => Code::Char(MIXED_SYMBOLS[(code - 20) as usize]),
            (Mode::Mixed, 27) => Code::Char(0x7F),
            (Mode::Mixed, 28) => Code::Latch(Mode::Lower),
            (Mode::Mixed, 29) => Code::Latch(Mode::Upper),
            (Mode::Mixed, 30) => Code::Latch(Mode::Punct),
            (Mode::Upper | Mode::Lower | Mode::Mixed, _) => Code::BinaryShift,
            (Mode::Punct, 2..=5) => Code::Pair(PUNCT_PAIRS[(code - 2) as usize]),
            (Mode::Punct, 6..=30) => Code::Char(PUNCT_SYMBOLS[(code - 6) as usize]),
            (Mode::Punct, _) => Code::Latch(Mode::Upper),
            (Mode::Digit, 2..=11) => Code::Char(b'0' + (code - 2) as u8),
            (Mode::Digit, 12) => Code::Char(b','),
            (Mode::Digit, 13) => Code::Char(b'.'),
            (Mode::Digit, 14) => Code::Latch(Mode::Upper),
            (Mode::Digit, _) => Code::Shift(Mode::Upper),
        }
    }

    /// Code for the byte at `data[i]` in this mode and how many bytes it covers
    pub(crate) fn code_for(self, data: &[u8], i: usize) -> Option<(u32, usize)> {
        let b = *data.get(i)?;
        if self == Mode::Punct {
            if let Some(next) = data.get(i + 1) {
                if let Some(p) = PUNCT_PAIRS.iter().position(|pair| **pair == [b, *next]) {
                    return Some((p as u32 + 2, 2));
                }
            }
        }
        let code = match (self, b) {
            (Mode::Punct, b'\r') => 1,
            (Mode::Punct, _) => PUNCT_SYMBOLS.iter().position(|&s| s == b)? as u32 + 6,
            (_, b' ') => 1,
            (Mode::Upper, b'A'..=b'Z') => (b - b'A') as u32 + 2,
            (Mode::Lower, b'a'..=b'z') => (b - b'a') as u32 + 2,
            (Mode::Mixed, 1..=13) => b as u32 + 1,
            (Mode::Mixed, 27..=31) => (b - 27) as u32 + 15,
            (Mode::Mixed, 0x7F) => 27,
            (Mode::Mixed, _) => MIXED_SYMBOLS.iter().position(|&s| s == b)? as u32 + 20,
            (Mode::Digit, b'0'..=b'9') => (b - b'0') as u32 + 2,
            (Mode::Digit, b',') => 12,
            (Mode::Digit, b'.') => 13,
            _ => return None,
        };
        Some((code, 1))
    }

    /// (code, bits) sequence that latches from `self` to `to`
    pub(crate) fn latch_to(self, to: Mode) -> &'static [(u32, usize)] {
        use Mode::*;
        match (self, to) {
            (Upper, Lower) => &[(28, 5)],
            (Upper, Mixed) => &[(29, 5)],
            (Upper, Digit) => &[(30, 5)],
            (Upper, Punct) => &[(29, 5), (30, 5)],
            (Lower, Upper) => &[(30, 5), (14, 4)],
            (Lower, Mixed) => &[(29, 5)],
            (Lower, Digit) => &[(30, 5)],
            (Lower, Punct) => &[(29, 5), (30, 5)],
            (Mixed, Upper) => &[(29, 5)],
            (Mixed, Lower) => &[(28, 5)],
            (Mixed, Digit) => &[(29, 5), (30, 5)],
            (Mixed, Punct) => &[(30, 5)],
            (Punct, Upper) => &[(31, 5)],
            (Punct, Lower) => &[(31, 5), (28, 5)],
            (Punct, Mixed) => &[(31, 5), (29, 5)],
            (Punct, Digit) => &[(31, 5), (30, 5)],
            (Digit, Upper) => &[(14, 4)],
            (Digit, Lower) => &[(14, 4), (28, 5)],
            (Digit, Mixed) => &[(14, 4), (29, 5)],
            (Digit, Punct) => &[(14, 4), (29, 5), (30, 5)],
            _ => &[],
        }
    }
}

/// Whether any mode can encode the byte at `data[i]`
pub(crate) fn is_text(data: &[u8], i: usize) -> bool {
    ALL_MODES.iter().any(|m| m.code_for(data, i).is_some())
}

/// Latch preference when several modes fit
pub(crate) const ALL_MODES: [Mode; 5] = [Mode::Upper, Mode::Lower, Mode::Digit, Mode::Mixed, Mode::Punct];
