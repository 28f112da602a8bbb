//! Code 93 with its two mod-47 check characters and full-ASCII shift pairs

use super::{RowCodec, RowMatch, RowRuns};
use crate::error::{DecodeFailure, Result, ZebraError};
use crate::models::{DecodeRequest, Symbology};

/// `a`..`d` stand for the four shift characters ($), (%), (/) and (+)
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%abcd*";

/// Nine-module bar patterns, first module in bit 8
const CHARACTER_ENCODINGS: [u32; 48] = [
    0x114, 0x148, 0x144, 0x142, 0x128, 0x124, 0x122, 0x150, 0x112, 0x10A, // 0-9
    0x1A8, 0x1A4, 0x1A2, 0x194, 0x192, 0x18A, 0x168, 0x164, 0x162, 0x134, // A-J
    0x11A, 0x158, 0x14C, 0x146, 0x12C, 0x116, 0x1B4, 0x1B2, 0x1AC, 0x1A6, // K-T
    0x196, 0x19A, 0x16C, 0x166, 0x136, 0x13A, // U-Z
    0x12E, 0x1D4, 0x1D2, 0x1CA, 0x16E, 0x176, 0x1AE, // - - %
    0x126, 0x1DA, 0x1D6, 0x132, 0x15E, // shifts, *
];

const ASTERISK: usize = 47;

/// Map six runs onto a nine-module pattern
fn to_pattern(counters: &[u32]) -> Option<u32> {
    let sum: u32 = counters.iter().sum();
    if sum == 0 {
        return None;
    }
    let mut pattern = 0u32;
    for (i, &c) in counters.iter().enumerate() {
        let scaled = (c as f32 * 9.0 / sum as f32).round() as u32;
        if !(1..=4).contains(&scaled) {
            return None;
        }
        pattern <<= scaled;
        if i % 2 == 0 {
            pattern |= (1 << scaled) - 1;
        }
    }
    Some(pattern)
}

fn decode_value(counters: &[u32]) -> Option<usize> {
    let pattern = to_pattern(counters)?;
    CHARACTER_ENCODINGS.iter().position(|&e| e == pattern)
}

/// Check value over `values`, weights cycling 1..=`max_weight` from the right
fn check_value(values: &[usize], max_weight: usize) -> usize {
    values
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &v)| v * (i % max_weight + 1))
        .sum::<usize>()
        % 47
}

/// Expand shift pairs back to full ASCII
fn decode_extended(encoded: &[u8]) -> std::result::Result<String, DecodeFailure> {
    let mut out = String::with_capacity(encoded.len());
    let mut iter = encoded.iter().copied();
    while let Some(c) = iter.next() {
        if !(b'a'..=b'd').contains(&c) {
            out.push(c as char);
            continue;
        }
        let next = iter
            .next()
            .ok_or_else(|| DecodeFailure::Malformed("dangling shift".into()))?;
        let decoded = match (c, next) {
            (b'd', b'A'..=b'Z') => next + 32,
            (b'a', b'A'..=b'Z') => next - 64,
            (b'b', b'A'..=b'E') => next - 38,
            (b'b', b'F'..=b'J') => next - 11,
            (b'b', b'K'..=b'O') => next + 16,
            (b'b', b'P'..=b'T') => next + 43,
            (b'b', b'U') => 0,
            (b'b', b'V') => b'@',
            (b'b', b'W') => b'`',
            (b'b', b'X'..=b'Z') => 127,
            (b'c', b'A'..=b'O') => next - 32,
            (b'c', b'Z') => b':',
            _ => {
                return Err(DecodeFailure::Malformed(format!(
                    "invalid shift pair {}{}",
                    c as char, next as char
                )));
            }
        };
        out.push(decoded as char);
    }
    Ok(out)
}

/// Rewrite full ASCII into the base alphabet plus shift pairs
fn encode_extended(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        if !ch.is_ascii() {
            return Err(ZebraError::invalid_payload(
                Symbology::Code93,
                format!("character {ch:?} is not ASCII"),
            ));
        }
        let c = ch as u8;
        match c {
            0 => out.extend(b"bU"),
            1..=26 => out.extend([b'a', b'A' + c - 1]),
            27..=31 => out.extend([b'b', b'A' + c - 27]),
            b' ' | b'$' | b'%' | b'+' => out.push(c),
            b'!'..=b',' => out.extend([b'c', b'A' + c - b'!']),
            b'-'..=b'9' => out.push(c),
            b':' => out.extend(b"cZ"),
            b';'..=b'?' => out.extend([b'b', b'F' + c - b';']),
            b'@' => out.extend(b"bV"),
            b'A'..=b'Z' => out.push(c),
            b'['..=b'_' => out.extend([b'b', b'K' + c - b'[']),
            b'`' => out.extend(b"bW"),
            b'a'..=b'z' => out.extend([b'd', b'A' + c - b'a']),
            _ => out.extend([b'b', b'P' + c - b'{']),
        }
    }
    Ok(out)
}

fn push_pattern(out: &mut Vec<bool>, encoding: u32) {
    for i in (0..9).rev() {
        out.push(encoding & (1 << i) != 0);
    }
}

/// Code 93
pub(crate) struct Code93;

impl RowCodec for Code93 {
    fn symbology(&self) -> Symbology {
        Symbology::Code93
    }

    fn find_starts(&self, runs: &RowRuns) -> Vec<usize> {
        runs.bar_indices()
            .filter(|&i| runs.window(i, 6).and_then(decode_value) == Some(ASTERISK))
            .filter(|&i| runs.quiet_before(i, runs.span(i, 6) as f32 / 2.0))
            .collect()
    }

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        _request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure> {
        let mut values = Vec::new();
        let mut pos = start + 6;
        loop {
            let window = runs.window(pos, 6).ok_or(DecodeFailure::NotFound)?;
            let value = decode_value(window).ok_or(DecodeFailure::NotFound)?;
            if value == ASTERISK {
                break;
            }
            values.push(value);
            pos += 6;
        }
        // termination bar, then quiet zone
        let bar = pos + 6;
        if bar >= runs.len() || !runs.quiet_after(bar, runs.span(pos, 6) as f32 / 2.0) {
            return Err(DecodeFailure::NotFound);
        }
        if values.len() < 3 {
            return Err(DecodeFailure::NotFound);
        }

        let n = values.len();
        if check_value(&values[..n - 2], 20) != values[n - 2]
            || check_value(&values[..n - 1], 15) != values[n - 1]
        {
            return Err(DecodeFailure::Checksum);
        }
        let encoded: Vec<u8> = values[..n - 2].iter().map(|&v| ALPHABET[v]).collect();
        Ok(RowMatch {
            text: decode_extended(&encoded)?,
            symbology: Symbology::Code93,
            start,
            end: bar + 1,
        })
    }

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>> {
        if text.is_empty() {
            return Err(ZebraError::invalid_payload(Symbology::Code93, "payload is empty"));
        }
        let mut values: Vec<usize> = encode_extended(text)?
            .into_iter()
            .filter_map(|c| ALPHABET.iter().position(|&a| a == c))
            .collect();
        values.push(check_value(&values, 20));
        values.push(check_value(&values, 15));

        let mut out = Vec::with_capacity((values.len() + 2) * 9 + 1);
        push_pattern(&mut out, CHARACTER_ENCODINGS[ASTERISK]);
        for &v in &values {
            push_pattern(&mut out, CHARACTER_ENCODINGS[v]);
        }
        push_pattern(&mut out, CHARACTER_ENCODINGS[ASTERISK]);
        out.push(true);
        Ok(out)
    }
}
