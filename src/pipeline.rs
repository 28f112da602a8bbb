//! Scan orchestration: normalize, binarize, then walk the requested formats
//! detector by detector until a candidate decodes.
//!
//! A format whose candidates include a located-but-unreadable symbol ends a
//! single-result scan with an error once all of its candidates are spent.

use crate::error::{DecodeFailure, Result, ZebraError};
use crate::models::{BitMatrix, DecodeRequest, DecodeResult, Decoded, PixelBuffer, Symbology};
use crate::registry::{CodecEntry, Registry, ScanImage};
use crate::utils::binarization::{binarize, otsu_binarize};
use crate::utils::grayscale::normalize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, trace, warn};

/// Deadline and cancellation, observed before every candidate
pub(crate) struct Checkpoint<'a> {
    deadline: Instant,
    timeout: Duration,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Checkpoint<'a> {
    pub(crate) fn new(timeout: Duration, cancel: Option<&'a AtomicBool>) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            timeout,
            cancel,
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            return Err(ZebraError::Cancelled);
        }
        if Instant::now() >= self.deadline {
            return Err(ZebraError::Timeout(self.timeout));
        }
        Ok(())
    }
}

/// Registered codecs for the request, in scan order
///
/// Unsupported members are skipped; a request with nothing supported is an error.
pub(crate) fn resolve(request: &DecodeRequest) -> Result<Vec<&'static CodecEntry>> {
    if request.formats.is_empty() {
        return Err(ZebraError::EmptyRequest);
    }
    let registry = Registry::global();
    let mut entries = Vec::with_capacity(request.formats.len());
    let mut unsupported = None;
    for &symbology in &request.formats {
        match registry.get(symbology) {
            Some(entry) => entries.push(entry),
            None => {
                warn!(%symbology, "skipping unsupported symbology");
                unsupported.get_or_insert(symbology);
            }
        }
    }
    match (entries.is_empty(), unsupported) {
        (true, Some(symbology)) => Err(ZebraError::UnsupportedSymbology(symbology)),
        _ => Ok(entries),
    }
}

/// What one pass over a bitmap produced
#[derive(Debug, Default)]
struct Pass {
    found: Vec<Decoded>,
    /// First format that proved a corrupt symbol present
    corrupt: Option<ZebraError>,
    /// Deadline or cancellation that cut the pass short
    interrupted: Option<ZebraError>,
}

impl Pass {
    fn push(&mut self, decoded: Decoded) {
        let duplicate = self
            .found
            .iter()
            .any(|d| d.symbology == decoded.symbology && d.text == decoded.text);
        if !duplicate {
            self.found.push(decoded);
        }
    }

    fn is_empty(&self) -> bool {
        self.found.is_empty() && self.corrupt.is_none() && self.interrupted.is_none()
    }
}

/// Try every candidate of every format; stops at the first success or corrupt
/// format unless `all` is set
fn scan_bitmap(
    bitmap: BitMatrix,
    entries: &[&CodecEntry],
    request: &DecodeRequest,
    checkpoint: &Checkpoint<'_>,
    all: bool,
    pass: &mut Pass,
) {
    let image = ScanImage::new(bitmap);
    if let Err(err) = scan_entries(&image, entries, request, checkpoint, all, pass) {
        debug!(%err, "scan interrupted");
        pass.interrupted = Some(err);
    }
}

fn scan_entries(
    image: &ScanImage,
    entries: &[&CodecEntry],
    request: &DecodeRequest,
    checkpoint: &Checkpoint<'_>,
    all: bool,
    pass: &mut Pass,
) -> Result<()> {
    for entry in entries {
        checkpoint.check()?;
        let regions = entry.detector.detect(image, request);
        debug!(symbology = %entry.symbology, candidates = regions.len(), "detecting");
        let mut failure: Option<DecodeFailure> = None;
        let mut corrupt_hits = 0;
        let mut decoded_any = false;
        for region in &regions {
            checkpoint.check()?;
            match entry.decoder.decode(image, region, request) {
                Ok(decoded) => {
                    debug!(symbology = %decoded.symbology, "decoded");
                    decoded_any = true;
                    pass.push(decoded);
                    if !all {
                        return Ok(());
                    }
                }
                Err(err) if err.is_corrupt_symbol() => {
                    trace!(symbology = %entry.symbology, %err, "corrupt candidate");
                    corrupt_hits += 1;
                    failure.get_or_insert(err);
                }
                Err(_) => {}
            }
        }
        if decoded_any || corrupt_hits < entry.min_corrupt_hits {
            continue;
        }
        if let Some(err) = failure {
            let err = err.into_error(entry.symbology);
            debug!(%err, "located symbol could not be read");
            pass.corrupt.get_or_insert(err);
            if !all {
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Normalize, binarize and scan; `try_harder` adds a global-threshold pass when the
/// adaptive bitmap yields nothing at all
#[instrument(
    level = "debug",
    skip_all,
    fields(width = buffer.width(), height = buffer.height(), all = all)
)]
fn run(
    buffer: &PixelBuffer,
    request: &DecodeRequest,
    cancel: Option<&AtomicBool>,
    all: bool,
) -> Result<Pass> {
    let entries = resolve(request)?;
    let checkpoint = Checkpoint::new(request.timeout, cancel);
    debug!("normalizing");
    let grid = normalize(buffer)?;
    debug!("binarizing");
    let bitmap = binarize(&grid)?;

    let mut pass = Pass::default();
    scan_bitmap(bitmap, &entries, request, &checkpoint, all, &mut pass);
    if request.try_harder && pass.is_empty() {
        debug!("retrying with a global threshold");
        let bitmap = otsu_binarize(&grid)?;
        scan_bitmap(bitmap, &entries, request, &checkpoint, all, &mut pass);
    }
    Ok(pass)
}

/// Single-result scan
pub(crate) fn scan(
    buffer: &PixelBuffer,
    request: &DecodeRequest,
    cancel: Option<&AtomicBool>,
) -> Result<DecodeResult> {
    let pass = run(buffer, request, cancel, false)?;
    let outcome = match (pass.found.into_iter().next(), pass.corrupt, pass.interrupted) {
        (Some(decoded), _, _) => decoded.into_result(),
        (None, Some(err), _) | (None, None, Some(err)) => DecodeResult::from_error(err),
        (None, None, None) => DecodeResult::NotFound,
    };
    Ok(outcome)
}

/// Every distinct symbol, or a single NotFound / Error entry
///
/// Symbols found before the deadline are returned even when it expires.
pub(crate) fn scan_multiple(
    buffer: &PixelBuffer,
    request: &DecodeRequest,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<DecodeResult>> {
    let pass = run(buffer, request, cancel, true)?;
    if !pass.found.is_empty() {
        return Ok(pass.found.into_iter().map(Decoded::into_result).collect());
    }
    let outcome = match pass.corrupt.or(pass.interrupted) {
        Some(err) => DecodeResult::from_error(err),
        None => DecodeResult::NotFound,
    };
    Ok(vec![outcome])
}

/// Modules for `text`, or `UnsupportedSymbology` when no encoder is registered
pub(crate) fn encode(
    text: &str,
    symbology: Symbology,
    level: crate::models::ErrorCorrectionLevel,
) -> Result<BitMatrix> {
    let entry = Registry::global()
        .get(symbology)
        .ok_or(ZebraError::UnsupportedSymbology(symbology))?;
    let modules = entry.encoder.encode(text, level)?;
    debug!(%symbology, width = modules.width(), height = modules.height(), "encoded");
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorCorrectionLevel, PixelFormat};

    fn render(modules: &BitMatrix, scale: usize, margin: usize, row_height: usize) -> PixelBuffer {
        let linear = modules.height() == 1;
        let rows = if linear { row_height } else { modules.height() };
        let (w, h) = ((modules.width() + 2 * margin) * scale, (rows + 2 * margin) * scale);
        let mut data = vec![255u8; w * h];
        for y in 0..rows * scale {
            for x in 0..modules.width() * scale {
                let my = if linear { 0 } else { y / scale };
                if modules.get(x / scale, my) {
                    data[(y + margin * scale) * w + x + margin * scale] = 0;
                }
            }
        }
        PixelBuffer::new(w, h, PixelFormat::Grayscale, data).unwrap()
    }

    #[test]
    fn test_resolve_rules() {
        let empty = DecodeRequest::default().with_formats(std::iter::empty());
        assert_eq!(resolve(&empty).unwrap_err(), ZebraError::EmptyRequest);

        let only_unsupported =
            DecodeRequest::default().with_formats([Symbology::Pdf417, Symbology::MaxiCode]);
        assert_eq!(
            resolve(&only_unsupported).unwrap_err(),
            ZebraError::UnsupportedSymbology(Symbology::Pdf417)
        );

        let mixed = DecodeRequest::default().with_formats([Symbology::Pdf417, Symbology::QrCode]);
        let entries = resolve(&mixed).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbology, Symbology::QrCode);
    }

    #[test]
    fn test_checkpoint() {
        let cancel = AtomicBool::new(false);
        let checkpoint = Checkpoint::new(Duration::from_secs(60), Some(&cancel));
        assert!(checkpoint.check().is_ok());
        cancel.store(true, Ordering::Relaxed);
        assert_eq!(checkpoint.check(), Err(ZebraError::Cancelled));
        let expired = Checkpoint::new(Duration::ZERO, None);
        assert_eq!(expired.check(), Err(ZebraError::Timeout(Duration::ZERO)));
    }

    #[test]
    fn test_scan_finds_qr() {
        let modules = encode("pipeline", Symbology::QrCode, ErrorCorrectionLevel::Medium).unwrap();
        let buffer = render(&modules, 4, 4, 0);
        let result = scan(&buffer, &DecodeRequest::default(), None).unwrap();
        assert_eq!(result.text(), Some("pipeline"));
        assert_eq!(result.symbology(), Some(Symbology::QrCode));
    }

    #[test]
    fn test_blank_is_not_found() {
        let buffer = PixelBuffer::filled(64, 64, 255).unwrap();
        let request = DecodeRequest::default().try_harder(true);
        assert_eq!(scan(&buffer, &request, None).unwrap(), DecodeResult::NotFound);
        assert_eq!(scan_multiple(&buffer, &request, None).unwrap(), vec![DecodeResult::NotFound]);
    }

    #[test]
    fn test_expired_budget_is_error() {
        let buffer = PixelBuffer::filled(32, 32, 255).unwrap();
        let request = DecodeRequest::default().timeout(Duration::ZERO);
        match scan(&buffer, &request, None).unwrap() {
            DecodeResult::Error { cause, .. } => {
                assert_eq!(cause, Some(ZebraError::Timeout(Duration::ZERO)))
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_symbols_in_one_image() {
        let qr = encode("LEFT", Symbology::QrCode, ErrorCorrectionLevel::Low).unwrap();
        let dm = encode("RIGHT", Symbology::DataMatrix, ErrorCorrectionLevel::Low).unwrap();
        let (scale, margin) = (4, 4);
        let side = (qr.width().max(dm.width()) + 2 * margin) * scale;
        let mut data = vec![255u8; side * 2 * side];
        for (symbol, offset) in [(&qr, 0), (&dm, side)] {
            for y in 0..symbol.height() * scale {
                for x in 0..symbol.width() * scale {
                    if symbol.get(x / scale, y / scale) {
                        data[(y + margin * scale) * 2 * side + offset + x + margin * scale] = 0;
                    }
                }
            }
        }
        let buffer = PixelBuffer::new(2 * side, side, PixelFormat::Grayscale, data).unwrap();
        let results = scan_multiple(&buffer, &DecodeRequest::default(), None).unwrap();
        let mut texts: Vec<_> = results.iter().filter_map(|r| r.text()).collect();
        texts.sort_unstable();
        assert_eq!(texts, vec!["LEFT", "RIGHT"]);
    }

    #[test]
    fn test_unsupported_encode() {
        assert_eq!(
            encode("x", Symbology::Pdf417, ErrorCorrectionLevel::Medium).unwrap_err(),
            ZebraError::UnsupportedSymbology(Symbology::Pdf417)
        );
    }
}
