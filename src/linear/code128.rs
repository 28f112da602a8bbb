//! Code 128 with code sets A, B and C and the mod-103 checksum

use super::{RowCodec, RowMatch, RowRuns, pattern_variance, push_widths};
use crate::error::{DecodeFailure, Result, ZebraError};
use crate::models::{DecodeRequest, Symbology};

const MAX_AVG_VARIANCE: f32 = 0.25;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.7;

/// Bar/space widths of codes 0..=105 plus the first six elements of STOP
const CODE_PATTERNS: [[u32; 6]; 107] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3], [1, 2, 1, 3, 2, 2], [1, 3, 1, 2, 2, 2],
    [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2], [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3], [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1], [1, 1, 3, 2, 2, 2], [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1],
    [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2], [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2], [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2], [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1],
    [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1], [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3], [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3], [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1],
    [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1], [1, 3, 2, 1, 3, 1], [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1], [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3], [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1],
    [3, 1, 1, 1, 2, 3], [3, 1, 1, 3, 2, 1], [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4], [1, 1, 1, 4, 2, 2], [1, 2, 1, 1, 2, 4],
    [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2], [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4], [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1], [2, 4, 1, 2, 1, 1], [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1],
    [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1], [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2], [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2], [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1],
    [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1], [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1], [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1], [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1],
    [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2], [2, 1, 1, 2, 1, 4], [2, 1, 1, 2, 3, 2],
    [2, 3, 3, 1, 1, 1],
];

const STOP_PATTERN: [u32; 7] = [2, 3, 3, 1, 1, 1, 2];

const CODE_SHIFT: usize = 98;
const CODE_CODE_C: usize = 99;
const CODE_CODE_B: usize = 100;
const CODE_CODE_A: usize = 101;
const CODE_FNC_1: usize = 102;
const CODE_FNC_4_A: usize = 101;
const CODE_FNC_4_B: usize = 100;
const CODE_START_A: usize = 103;
const CODE_START_B: usize = 104;
const CODE_START_C: usize = 105;
const CODE_STOP: usize = 106;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

fn decode_code(counters: &[u32], range: std::ops::Range<usize>) -> Option<usize> {
    let mut best = None;
    let mut best_variance = MAX_AVG_VARIANCE;
    for code in range {
        let variance = pattern_variance(counters, &CODE_PATTERNS[code], MAX_INDIVIDUAL_VARIANCE);
        if variance < best_variance {
            best_variance = variance;
            best = Some(code);
        }
    }
    best
}

/// Code 128
pub(crate) struct Code128;

impl RowCodec for Code128 {
    fn symbology(&self) -> Symbology {
        Symbology::Code128
    }

    fn find_starts(&self, runs: &RowRuns) -> Vec<usize> {
        runs.bar_indices()
            .filter(|&i| {
                runs.window(i, 6)
                    .and_then(|w| decode_code(w, CODE_START_A..CODE_START_C + 1))
                    .is_some()
            })
            .filter(|&i| runs.quiet_before(i, runs.span(i, 6) as f32 / 2.0))
            .collect()
    }

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        _request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure> {
        let window = runs.window(start, 6).ok_or(DecodeFailure::NotFound)?;
        let start_code =
            decode_code(window, CODE_START_A..CODE_START_C + 1).ok_or(DecodeFailure::NotFound)?;

        let mut codes = Vec::new();
        let mut pos = start + 6;
        loop {
            let window = runs.window(pos, 6).ok_or(DecodeFailure::NotFound)?;
            let code = decode_code(window, 0..CODE_STOP + 1).ok_or(DecodeFailure::NotFound)?;
            if code >= CODE_START_A && code != CODE_STOP {
                return Err(DecodeFailure::NotFound);
            }
            pos += 6;
            if code == CODE_STOP {
                break;
            }
            codes.push(code);
        }
        // stop pattern ends in a two-module bar followed by the quiet zone
        let bar = pos;
        let stop_runs = runs.window(pos - 6, 7).ok_or(DecodeFailure::NotFound)?;
        if pattern_variance(stop_runs, &STOP_PATTERN, MAX_INDIVIDUAL_VARIANCE) >= MAX_AVG_VARIANCE
            || !runs.quiet_after(bar, runs.span(pos - 6, 7) as f32 / 2.0)
        {
            return Err(DecodeFailure::NotFound);
        }
        let Some((&checksum, data)) = codes.split_last() else {
            return Err(DecodeFailure::NotFound);
        };
        if data.is_empty() {
            return Err(DecodeFailure::NotFound);
        }

        let total = data
            .iter()
            .enumerate()
            .fold(start_code, |acc, (i, &c)| acc + c * (i + 1));
        if total % 103 != checksum {
            return Err(DecodeFailure::Checksum);
        }

        Ok(RowMatch {
            text: decode_codes(start_code, data)?,
            symbology: Symbology::Code128,
            start,
            end: bar + 1,
        })
    }

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>> {
        let codes = encode_codes(text)?;
        let mut out = Vec::with_capacity(codes.len() * 11 + 13);
        for &code in &codes {
            push_widths(&mut out, &CODE_PATTERNS[code], true);
        }
        push_widths(&mut out, &STOP_PATTERN, true);
        Ok(out)
    }
}

/// Turn data codes (after the start code, before the checksum) into text
fn decode_codes(start_code: usize, data: &[usize]) -> std::result::Result<String, DecodeFailure> {
    let mut set = match start_code {
        CODE_START_A => CodeSet::A,
        CODE_START_B => CodeSet::B,
        _ => CodeSet::C,
    };
    let mut text = String::new();
    let mut shift = false;
    let mut fnc4_next = false;
    let mut fnc4_latched = false;

    for (i, &code) in data.iter().enumerate() {
        let active = if shift {
            match set {
                CodeSet::A => CodeSet::B,
                CodeSet::B => CodeSet::A,
                CodeSet::C => CodeSet::C,
            }
        } else {
            set
        };
        shift = false;

        match active {
            CodeSet::A | CodeSet::B if code < 96 => {
                let byte = match active {
                    CodeSet::A if code >= 64 => (code - 64) as u8,
                    _ => (code + 32) as u8,
                };
                let high = fnc4_next != fnc4_latched;
                fnc4_next = false;
                text.push(char::from(if high { byte | 0x80 } else { byte }));
            }
            CodeSet::C if code < 100 => {
                text.push(char::from(b'0' + (code / 10) as u8));
                text.push(char::from(b'0' + (code % 10) as u8));
            }
            _ => match code {
                CODE_FNC_1 => {
                    // leading FNC1 marks GS1 data; elsewhere it is a group separator
                    if i > 0 {
                        text.push('\u{1d}');
                    }
                }
                96 | 97 if active != CodeSet::C => {}
                CODE_SHIFT if active != CodeSet::C => shift = true,
                CODE_CODE_C if active != CodeSet::C => set = CodeSet::C,
                CODE_FNC_4_B if active == CodeSet::B => {
                    if fnc4_next {
                        fnc4_latched = !fnc4_latched;
                        fnc4_next = false;
                    } else {
                        fnc4_next = true;
                    }
                }
                CODE_FNC_4_A if active == CodeSet::A => {
                    if fnc4_next {
                        fnc4_latched = !fnc4_latched;
                        fnc4_next = false;
                    } else {
                        fnc4_next = true;
                    }
                }
                CODE_CODE_B => set = CodeSet::B,
                CODE_CODE_A => set = CodeSet::A,
                _ => {
                    return Err(DecodeFailure::Malformed(format!(
                        "code {code} is invalid in code set {active:?}"
                    )));
                }
            },
        }
    }
    Ok(text)
}

fn switch_set(codes: &mut Vec<usize>, set: &mut Option<CodeSet>, to: CodeSet) {
    let code = match (*set, to) {
        (None, CodeSet::A) => CODE_START_A,
        (None, CodeSet::B) => CODE_START_B,
        (None, CodeSet::C) => CODE_START_C,
        (_, CodeSet::C) => CODE_CODE_C,
        (_, CodeSet::B) => CODE_CODE_B,
        (_, CodeSet::A) => CODE_CODE_A,
    };
    codes.push(code);
    *set = Some(to);
}

fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Code values from start code through checksum
fn encode_codes(text: &str) -> Result<Vec<usize>> {
    if text.is_empty() {
        return Err(ZebraError::invalid_payload(Symbology::Code128, "payload is empty"));
    }
    if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
        return Err(ZebraError::invalid_payload(
            Symbology::Code128,
            format!("character {c:?} is not ASCII"),
        ));
    }
    let bytes = text.as_bytes();
    let mut codes: Vec<usize> = Vec::with_capacity(bytes.len() + 3);
    let mut set: Option<CodeSet> = None;

    let mut i = 0;
    while i < bytes.len() {
        let run = digit_run(&bytes[i..]);
        let whole_even = i == 0 && run == bytes.len() && run % 2 == 0;
        if set != Some(CodeSet::C) && ((run >= 4 && run % 2 == 0) || whole_even) {
            switch_set(&mut codes, &mut set, CodeSet::C);
        }
        if set == Some(CodeSet::C) && run >= 2 {
            codes.push((bytes[i] - b'0') as usize * 10 + (bytes[i + 1] - b'0') as usize);
            i += 2;
            continue;
        }
        let b = bytes[i];
        let wanted = match (b, set) {
            (0..=31, _) => CodeSet::A,
            (96..=127, _) => CodeSet::B,
            (_, Some(CodeSet::A)) => CodeSet::A,
            _ => CodeSet::B,
        };
        if set != Some(wanted) {
            switch_set(&mut codes, &mut set, wanted);
        }
        codes.push(match wanted {
            CodeSet::A if b < 32 => b as usize + 64,
            _ => b as usize - 32,
        });
        i += 1;
    }

    let checksum = codes
        .iter()
        .enumerate()
        .fold(0usize, |acc, (i, &c)| acc + c * i.max(1))
        % 103;
    codes.push(checksum);
    Ok(codes)
}
