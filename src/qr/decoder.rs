//! Module grid to payload: format, unmasking, de-interleaving and correction.

use super::format::{FormatInfo, read_version};
use super::function_mask::FunctionMask;
use super::mask::apply_mask;
use super::payload::{Payload, decode_segments};
use super::placement::read_codewords;
use super::tables::{ec_block_info, version_for_dimension};
use crate::ecc::{ReedSolomonDecoder, galois};
use crate::error::DecodeFailure;
use crate::models::{BitMatrix, ErrorCorrectionLevel};
use tracing::trace;

/// Decode a sampled grid, retrying the mirror image when the format words do not read
pub(crate) fn decode_matrix(grid: &BitMatrix) -> Result<Payload, DecodeFailure> {
    let first = decode_oriented(grid);
    if first.is_ok() {
        return first;
    }
    match decode_oriented(&grid.transpose()) {
        Ok(payload) => Ok(payload),
        Err(DecodeFailure::NotFound) => first,
        Err(mirrored) => match first {
            Err(DecodeFailure::NotFound) => Err(mirrored),
            other => other,
        },
    }
}

fn decode_oriented(grid: &BitMatrix) -> Result<Payload, DecodeFailure> {
    let version = version_for_dimension(grid.width()).ok_or(DecodeFailure::NotFound)?;
    let format = FormatInfo::read(grid).ok_or(DecodeFailure::NotFound)?;
    if version >= 7 && read_version(grid).is_some_and(|v| v != version) {
        return Err(DecodeFailure::NotFound);
    }
    trace!(version, level = ?format.level, mask = format.mask, "QR format read");

    let func = FunctionMask::new(version);
    let mut unmasked = grid.clone();
    apply_mask(&mut unmasked, format.mask, &func);
    let codewords = read_codewords(&unmasked, &func);
    let data = deinterleave_and_correct(&codewords, version, format.level)?;
    decode_segments(&data, version)
}

/// Undo block interleaving and correct every block; returns the data codewords
pub(crate) fn deinterleave_and_correct(
    codewords: &[u8],
    version: u8,
    level: ErrorCorrectionLevel,
) -> Result<Vec<u8>, DecodeFailure> {
    let info = ec_block_info(version, level).ok_or(DecodeFailure::NotFound)?;
    let total = codewords.len();
    let ecc_total = info.num_blocks * info.ecc_per_block;
    if total <= ecc_total {
        return Err(DecodeFailure::NotFound);
    }
    let data_total = total - ecc_total;
    let num_long_blocks = data_total % info.num_blocks;
    let num_short_blocks = info.num_blocks - num_long_blocks;
    let short_len = data_total / info.num_blocks;

    let block_len = |b: usize| short_len + usize::from(b >= num_short_blocks);
    let mut blocks: Vec<Vec<u8>> = (0..info.num_blocks)
        .map(|b| Vec::with_capacity(block_len(b) + info.ecc_per_block))
        .collect();

    let mut words = codewords.iter().copied();
    for i in 0..=short_len {
        for (b, block) in blocks.iter_mut().enumerate() {
            if i < block_len(b) {
                block.push(words.next().ok_or(DecodeFailure::NotFound)?);
            }
        }
    }
    for _ in 0..info.ecc_per_block {
        for block in blocks.iter_mut() {
            block.push(words.next().ok_or(DecodeFailure::NotFound)?);
        }
    }

    let rs = ReedSolomonDecoder::new(galois::qr_code());
    let mut data = Vec::with_capacity(data_total);
    for (b, block) in blocks.iter_mut().enumerate() {
        rs.decode_bytes(block, info.ecc_per_block)
            .map_err(|_| DecodeFailure::ErrorCorrection)?;
        data.extend_from_slice(&block[..block_len(b)]);
    }
    Ok(data)
}
