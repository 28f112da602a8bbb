//! MSB-first bit streams shared by the matrix codecs.

/// Reads big-endian bit fields out of a byte or bit sequence
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: BitSource<'a>,
    pos: usize,
}

#[derive(Debug, Clone)]
enum BitSource<'a> {
    Bytes(&'a [u8]),
    Bools(&'a [bool]),
}

impl<'a> BitReader<'a> {
    /// Read over whole bytes, most significant bit first
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bits: BitSource::Bytes(bytes),
            pos: 0,
        }
    }

    /// Read over individual bits
    pub fn from_bits(bits: &'a [bool]) -> Self {
        Self {
            bits: BitSource::Bools(bits),
            pos: 0,
        }
    }

    fn len(&self) -> usize {
        match self.bits {
            BitSource::Bytes(b) => b.len() * 8,
            BitSource::Bools(b) => b.len(),
        }
    }

    fn bit(&self, i: usize) -> bool {
        match self.bits {
            BitSource::Bytes(b) => (b[i / 8] >> (7 - i % 8)) & 1 == 1,
            BitSource::Bools(b) => b[i],
        }
    }

    /// Bits not yet consumed
    pub fn available(&self) -> usize {
        self.len().saturating_sub(self.pos)
    }

    /// Bits consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read `n` bits (n <= 32); `None` if fewer remain
    pub fn read(&mut self, n: usize) -> Option<u32> {
        if n > 32 || n > self.available() {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..n {
            value = (value << 1) | self.bit(self.pos) as u32;
            self.pos += 1;
        }
        Some(value)
    }
}

/// Growable MSB-first bit buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitWriter {
    bits: Vec<bool>,
}

impl BitWriter {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `n` bits of `value`, most significant first
    pub fn append(&mut self, value: u32, n: usize) {
        for i in (0..n).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    /// Append one bit
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Number of bits written
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether nothing was written
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Written bits
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Pack into bytes, zero-padding the final byte
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &b)| acc | ((b as u8) << (7 - i)))
            })
            .collect()
    }
}

/// Decode bytes as UTF-8, falling back to ISO-8859-1
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// ECI designator for UTF-8
pub const ECI_UTF8: u32 = 26;

/// Character set announced by an ECI designator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// No designator seen: UTF-8 when valid, ISO-8859-1 otherwise
    #[default]
    Guess,
    /// ECI 26
    Utf8,
    /// ECI 1 and 3
    Latin1,
}

impl Charset {
    /// Charset for an ECI assignment number; unknown numbers fall back to guessing
    pub fn from_eci(value: u32) -> Self {
        match value {
            ECI_UTF8 => Charset::Utf8,
            1 | 3 => Charset::Latin1,
            _ => Charset::Guess,
        }
    }

    /// Turn payload bytes into text
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Guess => decode_text(bytes),
        }
    }
}

/// Decoded message: display text plus the byte-level payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Message {
    pub text: String,
    pub bytes: Vec<u8>,
}

/// Bytes collected so far, flushed through the charset in force when they were read
#[derive(Default)]
pub(crate) struct MessageBuilder {
    message: Message,
    pending: Vec<u8>,
    charset: Charset,
}

impl MessageBuilder {
    pub(crate) fn push(&mut self, b: u8) {
        self.pending.push(b);
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Switch charset; bytes already collected keep the previous one
    pub(crate) fn set_charset(&mut self, charset: Charset) {
        self.flush();
        self.charset = charset;
    }

    fn flush(&mut self) {
        let text = self.charset.decode(&self.pending);
        self.message.text.push_str(&text);
        self.message.bytes.append(&mut self.pending);
    }

    pub(crate) fn finish(mut self) -> Message {
        self.flush();
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_fields() {
        let data = [0b1010_1100, 0b0101_0011];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read(4), Some(0b1010));
        assert_eq!(r.read(8), Some(0b1100_0101));
        assert_eq!(r.available(), 4);
        assert_eq!(r.read(5), None);
        assert_eq!(r.read(4), Some(0b0011));
    }

    #[test]
    fn test_writer_packs_msb_first() {
        let mut w = BitWriter::new();
        w.append(0b101, 3);
        w.append(0xFF, 8);
        assert_eq!(w.len(), 11);
        assert_eq!(w.to_bytes(), vec![0b1011_1111, 0b1110_0000]);

        let mut r = BitReader::from_bits(w.bits());
        assert_eq!(r.read(3), Some(0b101));
    }

    #[test]
    fn test_decode_text_fallback() {
        assert_eq!(decode_text("héllo".as_bytes()), "héllo");
        assert_eq!(decode_text(&[0x41, 0xE9]), "Aé");
    }

    #[test]
    fn test_eci_charsets() {
        assert_eq!(Charset::from_eci(3).decode(&[0xC3, 0xA9]), "Ã©");
        assert_eq!(Charset::from_eci(ECI_UTF8).decode(&[0xC3, 0xA9]), "é");
        assert_eq!(Charset::from_eci(20), Charset::Guess);
    }
}
