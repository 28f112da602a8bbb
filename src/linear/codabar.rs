//! Codabar: seven elements per character, framed by one of the A..D start/stop characters

use super::{RowCodec, RowMatch, RowRuns, push_widths, wide_mask};
use crate::error::{DecodeFailure, Result, ZebraError};
use crate::models::{DecodeRequest, Symbology};

const ALPHABET: &[u8] = b"0123456789-$:/.+ABCD";

/// Narrow/wide masks, first element in bit 6
const CHARACTER_ENCODINGS: [u32; 20] = [
    0x003, 0x006, 0x009, 0x060, 0x012, 0x042, 0x021, 0x024, 0x030, 0x048, // 0-9
    0x00c, 0x018, 0x045, 0x051, 0x054, 0x015, 0x01A, 0x029, 0x00B, 0x00E, // -$:/.+ABCD
];

const START_END: &[u8] = b"ABCD";

const WIDE: u32 = 3;

fn decode_char(counters: &[u32]) -> Option<u8> {
    let mask = wide_mask(counters, 2).or_else(|| wide_mask(counters, 3))?;
    CHARACTER_ENCODINGS
        .iter()
        .position(|&e| e == mask)
        .map(|i| ALPHABET[i])
}

fn char_widths(c: u8) -> Option<[u32; 7]> {
    let index = ALPHABET.iter().position(|&a| a == c)?;
    let encoding = CHARACTER_ENCODINGS[index];
    let mut widths = [1u32; 7];
    for (i, w) in widths.iter_mut().enumerate() {
        if encoding & (1 << (6 - i)) != 0 {
            *w = WIDE;
        }
    }
    Some(widths)
}

/// Codabar
pub(crate) struct Codabar;

impl RowCodec for Codabar {
    fn symbology(&self) -> Symbology {
        Symbology::Codabar
    }

    fn find_starts(&self, runs: &RowRuns) -> Vec<usize> {
        runs.bar_indices()
            .filter(|&i| {
                runs.window(i, 7)
                    .and_then(decode_char)
                    .is_some_and(|c| START_END.contains(&c))
            })
            .filter(|&i| runs.quiet_before(i, runs.span(i, 7) as f32 / 2.0))
            .collect()
    }

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        _request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure> {
        let mut text = String::new();
        let mut pos = start + 8;
        loop {
            let window = runs.window(pos, 7).ok_or(DecodeFailure::NotFound)?;
            let c = decode_char(window).ok_or(DecodeFailure::NotFound)?;
            if START_END.contains(&c) {
                break;
            }
            text.push(c as char);
            pos += 8;
        }
        if text.is_empty() || !runs.quiet_after(pos + 6, runs.span(pos, 7) as f32 / 2.0) {
            return Err(DecodeFailure::NotFound);
        }
        Ok(RowMatch {
            text,
            symbology: Symbology::Codabar,
            start,
            end: pos + 7,
        })
    }

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>> {
        if text.is_empty() {
            return Err(ZebraError::invalid_payload(Symbology::Codabar, "payload is empty"));
        }
        let mut chars = vec![b'A'];
        for c in text.bytes() {
            if START_END.contains(&c) || !ALPHABET.contains(&c) {
                return Err(ZebraError::invalid_payload(
                    Symbology::Codabar,
                    format!("character {:?} is not a Codabar data character", c as char),
                ));
            }
            chars.push(c);
        }
        chars.push(b'B');

        let mut out = Vec::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 {
                out.push(false);
            }
            let widths = char_widths(c).ok_or_else(|| {
                ZebraError::invalid_payload(Symbology::Codabar, "character outside the Codabar set")
            })?;
            push_widths(&mut out, &widths, true);
        }
        Ok(out)
    }
}
