//! EAN-13, EAN-8, UPC-A and UPC-E
//!
//! All four share the 7-module digit patterns. Left-half digits come in an odd (L)
//! and an even (G) parity; EAN-13 hides its first digit in the L/G sequence and
//! UPC-E hides its number system and check digit the same way.

use super::{RowCodec, RowMatch, RowRuns, mod10_check_digit, pattern_variance, push_widths};
use crate::error::{DecodeFailure, Result, ZebraError};
use crate::models::{DecodeRequest, Symbology};

const MAX_AVG_VARIANCE: f32 = 0.48;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.7;

/// Light modules required before the start guard and after the end guard, unless
/// the symbol reaches the row edge
const QUIET_BEFORE: f32 = 9.0;
const QUIET_AFTER: f32 = 7.0;

const START_END_PATTERN: [u32; 3] = [1, 1, 1];
const MIDDLE_PATTERN: [u32; 5] = [1, 1, 1, 1, 1];
const UPC_E_END_PATTERN: [u32; 6] = [1, 1, 1, 1, 1, 1];

/// L-parity digit widths, starting with a space
const L_PATTERNS: [[u32; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// Parity of the six left digits for each EAN-13 first digit; bit 5 is the first, set = G
const FIRST_DIGIT_ENCODINGS: [u32; 10] = [0x00, 0x0B, 0x0D, 0x0E, 0x13, 0x19, 0x1C, 0x15, 0x16, 0x1A];

/// UPC-E digit parities for number systems 0 and 1, indexed by check digit
const NUMSYS_AND_CHECK_DIGIT_PATTERNS: [[u32; 10]; 2] = [
    [0x38, 0x34, 0x32, 0x31, 0x2C, 0x26, 0x23, 0x2A, 0x29, 0x25],
    [0x07, 0x0B, 0x0D, 0x0E, 0x13, 0x19, 0x1C, 0x15, 0x16, 0x1A],
];

fn g_pattern(digit: usize) -> [u32; 4] {
    let mut p = L_PATTERNS[digit];
    p.reverse();
    p
}

/// Best digit for four runs; values 10..19 mean G parity
fn decode_digit(counters: &[u32], allow_g: bool) -> Option<usize> {
    let mut best = None;
    let mut best_variance = MAX_AVG_VARIANCE;
    let candidates = if allow_g { 20 } else { 10 };
    for value in 0..candidates {
        let pattern = if value < 10 {
            L_PATTERNS[value]
        } else {
            g_pattern(value - 10)
        };
        let variance = pattern_variance(counters, &pattern, MAX_INDIVIDUAL_VARIANCE);
        if variance < best_variance {
            best_variance = variance;
            best = Some(value);
        }
    }
    best
}

fn matches(runs: &RowRuns, at: usize, pattern: &[u32]) -> bool {
    runs.window(at, pattern.len())
        .is_some_and(|w| pattern_variance(w, pattern, MAX_INDIVIDUAL_VARIANCE) < MAX_AVG_VARIANCE)
}

/// Start guards (bar, space, bar) preceded by a quiet zone
fn find_guards(runs: &RowRuns) -> Vec<usize> {
    runs.bar_indices()
        .filter(|&i| matches(runs, i, &START_END_PATTERN))
        .filter(|&i| runs.quiet_before(i, runs.span(i, 3) as f32 / 3.0 * QUIET_BEFORE))
        .collect()
}

/// End guard of `pattern` at `end` followed by a quiet zone
fn end_guard(runs: &RowRuns, end: usize, pattern: &[u32]) -> bool {
    let n = pattern.len();
    matches(runs, end, pattern)
        && runs.quiet_after(end + n - 1, runs.span(end, n) as f32 / n as f32 * QUIET_AFTER)
}

/// Decode `count` digits of four runs each; returns digits and the L/G parity mask
fn decode_digits(
    runs: &RowRuns,
    at: usize,
    count: usize,
    allow_g: bool,
) -> std::result::Result<(Vec<u8>, u32), DecodeFailure> {
    let mut digits = Vec::with_capacity(count);
    let mut parity = 0u32;
    for x in 0..count {
        let window = runs
            .window(at + x * 4, 4)
            .ok_or(DecodeFailure::NotFound)?;
        let value = decode_digit(window, allow_g).ok_or(DecodeFailure::NotFound)?;
        if value >= 10 {
            parity |= 1 << (count - 1 - x);
        }
        digits.push((value % 10) as u8);
    }
    Ok((digits, parity))
}

fn digits_text(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Decoded EAN-13 digits and the run just past the end guard
fn read_ean13(runs: &RowRuns, start: usize) -> std::result::Result<(Vec<u8>, usize), DecodeFailure> {
    let (left, parity) = decode_digits(runs, start + 3, 6, true)?;
    let first = FIRST_DIGIT_ENCODINGS
        .iter()
        .position(|&p| p == parity)
        .ok_or(DecodeFailure::NotFound)?;
    if !matches(runs, start + 27, &MIDDLE_PATTERN) {
        return Err(DecodeFailure::NotFound);
    }
    let (right, _) = decode_digits(runs, start + 32, 6, false)?;
    let end = start + 56;
    if !end_guard(runs, end, &START_END_PATTERN) {
        return Err(DecodeFailure::NotFound);
    }
    let mut digits = Vec::with_capacity(13);
    digits.push(first as u8);
    digits.extend(left);
    digits.extend(right);
    if mod10_check_digit(&digits[..12]) != digits[12] {
        return Err(DecodeFailure::Checksum);
    }
    Ok((digits, end + 3))
}

/// Parse a digit string of exactly `len` digits
fn parse_digits(text: &str, len: usize, symbology: Symbology) -> Result<Vec<u8>> {
    if text.len() != len || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ZebraError::invalid_payload(
            symbology,
            format!("expected exactly {len} digits"),
        ));
    }
    let digits: Vec<u8> = text.bytes().map(|b| b - b'0').collect();
    if mod10_check_digit(&digits[..len - 1]) != digits[len - 1] {
        return Err(ZebraError::invalid_payload(symbology, "check digit does not match"));
    }
    Ok(digits)
}

fn encode_ean13(digits: &[u8]) -> Vec<bool> {
    let parities = FIRST_DIGIT_ENCODINGS[digits[0] as usize];
    let mut out = Vec::with_capacity(95);
    push_widths(&mut out, &START_END_PATTERN, true);
    for (i, &d) in digits[1..7].iter().enumerate() {
        let pattern = if (parities >> (5 - i)) & 1 == 1 {
            g_pattern(d as usize)
        } else {
            L_PATTERNS[d as usize]
        };
        push_widths(&mut out, &pattern, false);
    }
    push_widths(&mut out, &MIDDLE_PATTERN, false);
    for &d in &digits[7..] {
        push_widths(&mut out, &L_PATTERNS[d as usize], true);
    }
    push_widths(&mut out, &START_END_PATTERN, true);
    out
}

/// EAN-13
pub(crate) struct Ean13;

impl RowCodec for Ean13 {
    fn symbology(&self) -> Symbology {
        Symbology::Ean13
    }

    fn find_starts(&self, runs: &RowRuns) -> Vec<usize> {
        find_guards(runs)
    }

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure> {
        let (digits, end) = read_ean13(runs, start)?;
        let text = digits_text(&digits);
        // a UPC-A symbol is an EAN-13 symbol with a leading zero
        if digits[0] == 0 && request.formats.contains(&Symbology::UpcA) {
            return Ok(RowMatch {
                text: text[1..].to_string(),
                symbology: Symbology::UpcA,
                start,
                end,
            });
        }
        Ok(RowMatch {
            text,
            symbology: Symbology::Ean13,
            start,
            end,
        })
    }

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>> {
        Ok(encode_ean13(&parse_digits(text, 13, Symbology::Ean13)?))
    }
}

/// UPC-A, read and written as EAN-13 with a leading zero
pub(crate) struct UpcA;

impl RowCodec for UpcA {
    fn symbology(&self) -> Symbology {
        Symbology::UpcA
    }

    fn find_starts(&self, runs: &RowRuns) -> Vec<usize> {
        find_guards(runs)
    }

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        _request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure> {
        let (digits, end) = read_ean13(runs, start)?;
        if digits[0] != 0 {
            return Err(DecodeFailure::NotFound);
        }
        Ok(RowMatch {
            text: digits_text(&digits[1..]),
            symbology: Symbology::UpcA,
            start,
            end,
        })
    }

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>> {
        let mut digits = vec![0u8];
        digits.extend(parse_digits(text, 12, Symbology::UpcA)?);
        Ok(encode_ean13(&digits))
    }
}

/// EAN-8
pub(crate) struct Ean8;

impl RowCodec for Ean8 {
    fn symbology(&self) -> Symbology {
        Symbology::Ean8
    }

    fn find_starts(&self, runs: &RowRuns) -> Vec<usize> {
        find_guards(runs)
    }

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        _request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure> {
        let (mut digits, _) = decode_digits(runs, start + 3, 4, false)?;
        if !matches(runs, start + 19, &MIDDLE_PATTERN) {
            return Err(DecodeFailure::NotFound);
        }
        let (right, _) = decode_digits(runs, start + 24, 4, false)?;
        let end = start + 40;
        if !end_guard(runs, end, &START_END_PATTERN) {
            return Err(DecodeFailure::NotFound);
        }
        digits.extend(right);
        if mod10_check_digit(&digits[..7]) != digits[7] {
            return Err(DecodeFailure::Checksum);
        }
        Ok(RowMatch {
            text: digits_text(&digits),
            symbology: Symbology::Ean8,
            start,
            end: end + 3,
        })
    }

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>> {
        let digits = parse_digits(text, 8, Symbology::Ean8)?;
        let mut out = Vec::with_capacity(67);
        push_widths(&mut out, &START_END_PATTERN, true);
        for &d in &digits[..4] {
            push_widths(&mut out, &L_PATTERNS[d as usize], false);
        }
        push_widths(&mut out, &MIDDLE_PATTERN, false);
        for &d in &digits[4..] {
            push_widths(&mut out, &L_PATTERNS[d as usize], true);
        }
        push_widths(&mut out, &START_END_PATTERN, true);
        Ok(out)
    }
}

/// Expand an 8-digit UPC-E string (number system, six digits, check) to UPC-A
pub fn upc_e_to_upc_a(upc_e: &[u8]) -> Vec<u8> {
    let d = &upc_e[1..7];
    let mut out = vec![upc_e[0]];
    match d[5] {
        0..=2 => {
            out.extend_from_slice(&d[..2]);
            out.push(d[5]);
            out.extend([0, 0, 0, 0]);
            out.extend_from_slice(&d[2..5]);
        }
        3 => {
            out.extend_from_slice(&d[..3]);
            out.extend([0, 0, 0, 0, 0]);
            out.extend_from_slice(&d[3..5]);
        }
        4 => {
            out.extend_from_slice(&d[..4]);
            out.extend([0, 0, 0, 0, 0]);
            out.push(d[4]);
        }
        _ => {
            out.extend_from_slice(&d[..5]);
            out.extend([0, 0, 0, 0]);
            out.push(d[5]);
        }
    }
    out.push(upc_e[7]);
    out
}

/// UPC-E (zero-suppressed UPC-A)
pub(crate) struct UpcE;

impl RowCodec for UpcE {
    fn symbology(&self) -> Symbology {
        Symbology::UpcE
    }

    fn find_starts(&self, runs: &RowRuns) -> Vec<usize> {
        find_guards(runs)
    }

    fn decode_row(
        &self,
        runs: &RowRuns,
        start: usize,
        _request: &DecodeRequest,
    ) -> std::result::Result<RowMatch, DecodeFailure> {
        let (middle, parity) = decode_digits(runs, start + 3, 6, true)?;
        // end guard begins with a space
        let end = start + 27;
        if !end_guard(runs, end, &UPC_E_END_PATTERN) {
            return Err(DecodeFailure::NotFound);
        }
        let (number_system, check) = (0..2)
            .flat_map(|ns| (0..10).map(move |d| (ns, d)))
            .find(|&(ns, d)| NUMSYS_AND_CHECK_DIGIT_PATTERNS[ns][d] == parity)
            .ok_or(DecodeFailure::NotFound)?;
        let mut digits = vec![number_system as u8];
        digits.extend(middle);
        digits.push(check as u8);
        let upc_a = upc_e_to_upc_a(&digits);
        if mod10_check_digit(&upc_a[..11]) != upc_a[11] {
            return Err(DecodeFailure::Checksum);
        }
        Ok(RowMatch {
            text: digits_text(&digits),
            symbology: Symbology::UpcE,
            start,
            end: end + 6,
        })
    }

    fn encode_modules(&self, text: &str) -> Result<Vec<bool>> {
        if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ZebraError::invalid_payload(Symbology::UpcE, "expected exactly 8 digits"));
        }
        let digits: Vec<u8> = text.bytes().map(|b| b - b'0').collect();
        if digits[0] > 1 {
            return Err(ZebraError::invalid_payload(Symbology::UpcE, "number system must be 0 or 1"));
        }
        let upc_a = upc_e_to_upc_a(&digits);
        if mod10_check_digit(&upc_a[..11]) != digits[7] {
            return Err(ZebraError::invalid_payload(Symbology::UpcE, "check digit does not match"));
        }
        let parities = NUMSYS_AND_CHECK_DIGIT_PATTERNS[digits[0] as usize][digits[7] as usize];
        let mut out = Vec::with_capacity(51);
        push_widths(&mut out, &START_END_PATTERN, true);
        for (i, &d) in digits[1..7].iter().enumerate() {
            let pattern = if (parities >> (5 - i)) & 1 == 1 {
                g_pattern(d as usize)
            } else {
                L_PATTERNS[d as usize]
            };
            push_widths(&mut out, &pattern, false);
        }
        push_widths(&mut out, &UPC_E_END_PATTERN, false);
        Ok(out)
    }
}
