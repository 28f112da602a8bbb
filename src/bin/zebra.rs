//! zebra - scan barcodes in images and render new ones

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;
use zebra::{
    DecodeRequest, DecodeResult, EncodeRequest, ErrorCorrectionLevel, PixelBuffer, Scanner,
    Symbology,
};

#[derive(Parser, Debug)]
#[command(name = "zebra", version, about = "Multi-symbology barcode scanner and generator")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan an image file for barcodes
    Decode {
        /// Image to scan (any format the image crate reads)
        path: PathBuf,
        /// Restrict the scan to these symbologies, e.g. QR_CODE or ean-13
        #[arg(short, long = "format")]
        formats: Vec<Symbology>,
        /// Scan every row, rotated rows, and retry with a global threshold
        #[arg(long)]
        try_harder: bool,
        /// The image is a single unrotated symbol
        #[arg(long)]
        pure: bool,
        /// Report every symbol instead of the first
        #[arg(long)]
        all: bool,
        /// Give up after this many milliseconds
        #[arg(long, env = "ZEBRA_SCAN_TIMEOUT_MS")]
        timeout_ms: Option<u64>,
    },
    /// Render a barcode to a PNG file
    Encode {
        /// Payload text
        text: String,
        /// Symbology to render
        #[arg(short, long, default_value = "QR_CODE")]
        format: Symbology,
        /// Output file
        #[arg(short, long, default_value = "barcode.png")]
        out: PathBuf,
        /// Minimum width in pixels
        #[arg(long, default_value = "300")]
        width: usize,
        /// Minimum height in pixels
        #[arg(long, default_value = "300")]
        height: usize,
        /// Quiet zone in modules
        #[arg(long, default_value = "1")]
        margin: usize,
        /// Error-correction level for symbologies that have one
        #[arg(long, value_enum, default_value = "m")]
        ec: EcLevel,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EcLevel {
    L,
    M,
    Q,
    H,
}

impl From<EcLevel> for ErrorCorrectionLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => ErrorCorrectionLevel::Low,
            EcLevel::M => ErrorCorrectionLevel::Medium,
            EcLevel::Q => ErrorCorrectionLevel::Quartile,
            EcLevel::H => ErrorCorrectionLevel::High,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Decode {
            path,
            formats,
            try_harder,
            pure,
            all,
            timeout_ms,
        } => {
            let mut request = DecodeRequest::default()
                .try_harder(try_harder)
                .pure_barcode(pure);
            if !formats.is_empty() {
                request = request.with_formats(formats);
            }
            if let Some(ms) = timeout_ms {
                request = request.timeout(Duration::from_millis(ms));
            }
            decode_cmd(&path, request, all)
        }
        Command::Encode {
            text,
            format,
            out,
            width,
            height,
            margin,
            ec,
        } => {
            let request = EncodeRequest::new(text, format)
                .size(width, height)
                .margin(margin)
                .ec_level(ec.into());
            encode_cmd(&request, &out)
        }
    }
}

fn decode_cmd(path: &Path, request: DecodeRequest, all: bool) -> Result<()> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let buffer = PixelBuffer::from_dynamic_image(&img)?;
    info!(width = buffer.width(), height = buffer.height(), "loaded image");

    let scanner = Scanner::new(request);
    let results = if all {
        scanner.scan_multiple(&buffer)?
    } else {
        vec![scanner.scan(&buffer)?]
    };
    debug!(results = results.len(), "scan finished");

    let mut found = false;
    for result in &results {
        match result {
            DecodeResult::Success {
                text,
                symbology,
                bounding_box,
                ..
            } => {
                found = true;
                println!(
                    "{}\t{}\t{}x{}+{}+{}",
                    symbology.key(),
                    text,
                    bounding_box.width,
                    bounding_box.height,
                    bounding_box.x,
                    bounding_box.y
                );
            }
            DecodeResult::NotFound => println!("no barcode found"),
            DecodeResult::Error { message, .. } => bail!("{}: {message}", path.display()),
        }
    }
    if !found {
        std::process::exit(1);
    }
    Ok(())
}

fn encode_cmd(request: &EncodeRequest, out: &Path) -> Result<()> {
    let buffer = zebra::generate(request)
        .with_context(|| format!("Failed to encode {:?} as {}", request.text, request.symbology))?;
    let img = buffer
        .to_rgba_image()
        .ok_or_else(|| anyhow!("rendered buffer does not match its dimensions"))?;
    img.save(out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!(
        width = buffer.width(),
        height = buffer.height(),
        path = %out.display(),
        "wrote barcode"
    );
    Ok(())
}
