//! Code 39: five bars and four spaces per character, three of them wide

use super::{RowCodec, RowMatch, RowRuns, push_widths, wide_mask};
use crate::error::{DecodeFailure, Result, ZebraError};
use crate::models::{DecodeRequest, Symbology};

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";

/// Narrow/wide masks, first element in bit 8
const CHARACTER_ENCODINGS: [u32; 43] = [
    0x034, 0x121, 0x061, 0x160, 0x031, 0x130, 0x070, 0x025, 0x124, 0x064, // 0-9
    0x109, 0x049, 0x148, 0x019, 0x118, 0x058, 0x00D, 0x10C, 0x04C, 0x01C, // A-J
    0x103, 0x043, 0x142, 0x013, 0x112, 0x052, 0x007, 0x106, 0x046, 0x016, // K-T
    0x181, 0x0C1, 0x1C0, 0x091, 0x190, 0x0D0, 0x085, 0x184, 0x0C4, 0x0A8, // U-$
    0x0A2, 0x08A, 0x02A, // /-%
];

const ASTERISK_ENCODING: u32 = 0x094;

const WIDE: u32 = 3;

fn decode_char(counters: &[u32]) -> Option<u8> {
    let mask = wide_mask(counters, 3)?;
    if mask == ASTERISK_ENCODING {
        return Some(b'*');
    }
    CHARACTER_ENCODINGS
        .iter()
        .position(|&e| e == mask)
        .map(|i| ALPHABET[i])
}

fn char_widths(encoding: u32) -> [u32; 9] {
    let mut widths = [1u32; 9];
    for (i, w) in widths.iter_mut().enumerate() {
        if encoding & (1 << (8 - i)) != 0 {
            *w = WIDE;
        }
    }
    widths
}

/// Code 39 without check character
pub(crate) struct Code39;

impl RowCodec for Code39 {
    fn symbology(&self) -> Symbology {
        Symbology::Code39
    }

    fn find_starts(&self, runs: &RowRuns) -> Vec<usize> {
        runs.bar_indices()
            .filter(|&i| {
                runs.window(i, 9)
                    .is_some_and(|w| decode_char(w) == Some(b'*'))
            })
            .filter(|&i| runs.quiet_before(i, runs.span(i, 9) as f32 / 2.0))
            .collect()
    }

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        _request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure> {
        let mut text = String::new();
        let mut pos = start + 10;
        loop {
            let window = runs.window(pos, 9).ok_or(DecodeFailure::NotFound)?;
            let c = decode_char(window).ok_or(DecodeFailure::NotFound)?;
            if c == b'*' {
                break;
            }
            text.push(c as char);
            pos += 10;
        }
        if text.is_empty() || !runs.quiet_after(pos + 8, runs.span(pos, 9) as f32 / 2.0) {
            return Err(DecodeFailure::NotFound);
        }
        Ok(RowMatch {
            text,
            symbology: Symbology::Code39,
            start,
            end: pos + 9,
        })
    }

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>> {
        if text.is_empty() {
            return Err(ZebraError::invalid_payload(Symbology::Code39, "payload is empty"));
        }
        let mut encodings = vec![ASTERISK_ENCODING];
        for c in text.bytes() {
            let index = ALPHABET.iter().position(|&a| a == c).ok_or_else(|| {
                ZebraError::invalid_payload(
                    Symbology::Code39,
                    format!("character {:?} is outside the Code 39 set", c as char),
                )
            })?;
            encodings.push(CHARACTER_ENCODINGS[index]);
        }
        encodings.push(ASTERISK_ENCODING);

        let mut out = Vec::new();
        for (i, &e) in encodings.iter().enumerate() {
            if i > 0 {
                out.push(false);
            }
            push_widths(&mut out, &char_widths(e), true);
        }
        Ok(out)
    }
}
