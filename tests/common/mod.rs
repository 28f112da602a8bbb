//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::thread::{self, Thread};
use zebra::{BitMatrix, Color, DecodeRequest, EncodeRequest, PixelBuffer, Symbology};

/// One representative payload per supported symbology
pub const PAYLOADS: [(Symbology, &str); 12] = [
    (Symbology::Code128, "Zebra-128 lot 0042"),
    (Symbology::Code39, "CODE39 TEST-7"),
    (Symbology::Code93, "Code 93 full ASCII!"),
    (Symbology::Codabar, "40156-$:/.+"),
    (Symbology::Ean8, "96385074"),
    (Symbology::Ean13, "4006381333931"),
    (Symbology::UpcA, "123456789012"),
    (Symbology::UpcE, "01234565"),
    (Symbology::Itf, "00012345678905"),
    (Symbology::QrCode, "https://example.com/zebra?q=naïve"),
    (Symbology::DataMatrix, "LOT7 SN0042 EXP2027"),
    (Symbology::Aztec, "Aztec: compact & full-range"),
];

/// Render a symbol with a generous quiet zone, the way a printed label looks
pub fn render(symbology: Symbology, text: &str) -> PixelBuffer {
    zebra::generate(&EncodeRequest::new(text, symbology).size(800, 300).margin(6))
        .unwrap_or_else(|e| panic!("{symbology} should encode {text:?}: {e}"))
}

/// Rasterize raw modules with the default colours
pub fn render_modules(modules: &BitMatrix, margin: usize) -> PixelBuffer {
    zebra::raster::rasterize(modules, 800, 300, margin, Color::BLACK, Color::WHITE).unwrap()
}

pub fn only(symbology: Symbology) -> DecodeRequest {
    DecodeRequest::default().with_format(symbology)
}

struct Unpark(Thread);

impl Wake for Unpark {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }
}

/// Drive a future to completion on the current thread
pub fn block_on<F: Future>(future: F) -> F::Output {
    let waker = Waker::from(Arc::new(Unpark(thread::current())));
    let mut cx = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);
    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(value) => return value,
            Poll::Pending => thread::park(),
        }
    }
}
