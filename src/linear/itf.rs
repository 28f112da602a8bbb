//! Interleaved 2 of 5: digit pairs, the first in the bars and the second in the spaces

use super::{RowCodec, RowMatch, RowRuns, pattern_variance, push_widths, wide_mask};
use crate::error::{DecodeFailure, Result, ZebraError};
use crate::models::{DecodeRequest, Symbology};

const MAX_AVG_VARIANCE: f32 = 0.38;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.5;

const WIDE: u32 = 3;

const START_PATTERN: [u32; 4] = [1, 1, 1, 1];
const END_PATTERN: [u32; 3] = [WIDE, 1, 1];

/// Wide elements of each digit, first element in bit 4
const DIGIT_MASKS: [u32; 10] = [
    0b00110, 0b10001, 0b01001, 0b11000, 0b00101, 0b10100, 0b01100, 0b00011, 0b10010, 0b01010,
];

/// Quiet zone in narrow widths
const QUIET_ZONE: f32 = 10.0;

fn digit_widths(d: u8) -> [u32; 5] {
    let mask = DIGIT_MASKS[d as usize];
    let mut widths = [1u32; 5];
    for (i, w) in widths.iter_mut().enumerate() {
        if mask & (1 << (4 - i)) != 0 {
            *w = WIDE;
        }
    }
    widths
}

fn decode_digit(counters: &[u32]) -> Option<u8> {
    let mask = wide_mask(counters, 2)?;
    DIGIT_MASKS.iter().position(|&m| m == mask).map(|d| d as u8)
}

fn matches(runs: &RowRuns, at: usize, pattern: &[u32]) -> bool {
    runs.window(at, pattern.len())
        .is_some_and(|w| pattern_variance(w, pattern, MAX_INDIVIDUAL_VARIANCE) < MAX_AVG_VARIANCE)
}

/// Interleaved 2 of 5
pub(crate) struct Itf;

impl RowCodec for Itf {
    fn symbology(&self) -> Symbology {
        Symbology::Itf
    }

    fn find_starts(&self, runs: &RowRuns) -> Vec<usize> {
        runs.bar_indices()
            .filter(|&i| matches(runs, i, &START_PATTERN))
            .filter(|&i| runs.quiet_before(i, runs.span(i, 4) as f32 / 4.0 * QUIET_ZONE))
            .collect()
    }

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        _request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure> {
        let narrow = runs.span(start, 4) as f32 / 4.0;
        let mut text = String::new();
        let mut pos = start + 4;
        loop {
            if matches(runs, pos, &END_PATTERN) && runs.quiet_after(pos + 2, narrow * QUIET_ZONE) {
                break;
            }
            let window = runs.window(pos, 10).ok_or(DecodeFailure::NotFound)?;
            let bars: Vec<u32> = window.iter().step_by(2).copied().collect();
            let spaces: Vec<u32> = window.iter().skip(1).step_by(2).copied().collect();
            let first = decode_digit(&bars).ok_or(DecodeFailure::NotFound)?;
            let second = decode_digit(&spaces).ok_or(DecodeFailure::NotFound)?;
            text.push(char::from(b'0' + first));
            text.push(char::from(b'0' + second));
            pos += 10;
        }
        if text.is_empty() {
            return Err(DecodeFailure::NotFound);
        }
        Ok(RowMatch {
            text,
            symbology: Symbology::Itf,
            start,
            end: pos + 3,
        })
    }

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>> {
        if text.is_empty() || text.len() % 2 != 0 || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ZebraError::invalid_payload(
                Symbology::Itf,
                "expected a non-empty even number of digits",
            ));
        }
        let mut out = Vec::new();
        push_widths(&mut out, &START_PATTERN, true);
        for pair in text.as_bytes().chunks(2) {
            let bars = digit_widths(pair[0] - b'0');
            let spaces = digit_widths(pair[1] - b'0');
            let interleaved: Vec<u32> = bars
                .iter()
                .zip(&spaces)
                .flat_map(|(&b, &s)| [b, s])
                .collect();
            push_widths(&mut out, &interleaved, true);
        }
        push_widths(&mut out, &END_PATTERN, true);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str, quiet: usize) -> std::result::Result<RowMatch, DecodeFailure> {
        let mut row = vec![false; quiet];
        for m in Itf.encode_modules(text).unwrap() {
            row.extend([m, m]);
        }
        row.extend(vec![false; quiet]);
        let runs = RowRuns::from_bits(&row);
        let start = *Itf.find_starts(&runs).first().ok_or(DecodeFailure::NotFound)?;
        Itf.decode_row(&runs, start, &DecodeRequest::default())
    }

    #[test]
    fn test_every_digit_has_two_wide_elements() {
        for m in DIGIT_MASKS {
            assert_eq!(m.count_ones(), 2);
        }
    }

    #[test]
    fn test_round_trip() {
        assert_eq!(read("1234567890", 30).unwrap().text, "1234567890");
        assert_eq!(read("00", 30).unwrap().text, "00");
    }

    #[test]
    fn test_quiet_zone_touching_edge_is_accepted() {
        assert_eq!(read("4719", 0).unwrap().text, "4719");
    }

    #[test]
    fn test_rejects_odd_length() {
        assert!(Itf.encode_modules("123").is_err());
        assert!(Itf.encode_modules("").is_err());
        assert!(Itf.encode_modules("12a4").is_err());
    }
}
