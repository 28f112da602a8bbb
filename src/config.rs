//! Process-wide defaults, overridable through environment variables.
//!
//! Each value is read once and cached for the life of the process.

use std::sync::OnceLock;
use std::time::Duration;

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default)
}

static SCAN_TIMEOUT_MS: OnceLock<u64> = OnceLock::new();

/// Default scan budget (`ZEBRA_SCAN_TIMEOUT_MS`, 5000 ms)
pub fn default_scan_timeout() -> Duration {
    Duration::from_millis(
        *SCAN_TIMEOUT_MS.get_or_init(|| parse_env_u64("ZEBRA_SCAN_TIMEOUT_MS", 5000)),
    )
}

static MIN_BLOCK_CONTRAST: OnceLock<u8> = OnceLock::new();

/// Smallest max-min spread for a block to get its own threshold (`ZEBRA_MIN_BLOCK_CONTRAST`, 24)
pub fn min_block_contrast() -> u8 {
    *MIN_BLOCK_CONTRAST.get_or_init(|| parse_env_u8("ZEBRA_MIN_BLOCK_CONTRAST", 24).max(1))
}

static LINEAR_ROWS: OnceLock<usize> = OnceLock::new();

/// Rows sampled by a non-thorough linear scan (`ZEBRA_LINEAR_ROWS`, 15)
pub fn linear_rows() -> usize {
    *LINEAR_ROWS.get_or_init(|| parse_env_usize("ZEBRA_LINEAR_ROWS", 15).clamp(1, 4096))
}
