//! One-page receipt recording the outcome of a notarization attempt
//!
//! Field order is fixed: title, file name, size, last-modified time, hex
//! digest, and the notarization result (or the failure marker).

use crate::error::{NotarizerError, NotarizerResult};
use crate::evidence::FileDigest;
use crate::ledger::NotarizationOutcome;
use chrono::{DateTime, Local};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const RECEIPT_TITLE: &str = "Notarized File Summary";
pub const FAILURE_MARKER: &str = "Notarization failed.";

/// Everything printed on a receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub file_name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
    pub digest: FileDigest,
    pub outcome: NotarizationOutcome,
}

impl Receipt {
    /// Collect name, size and modification time from the file on disk
    pub fn from_file(
        path: &Path,
        digest: FileDigest,
        outcome: NotarizationOutcome,
    ) -> NotarizerResult<Self> {
        let metadata = fs::metadata(path)
            .map_err(|e| NotarizerError::ReceiptFailed(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| NotarizerError::InvalidPath(path.display().to_string()))?;
        let modified: DateTime<Local> = metadata.modified()?.into();

        Ok(Self {
            file_name,
            size_bytes: metadata.len(),
            modified,
            digest,
            outcome,
        })
    }

    pub fn title(&self) -> &'static str {
        RECEIPT_TITLE
    }

    /// Body lines, in print order
    pub fn lines(&self) -> Vec<String> {
        let result = match self.outcome.reference() {
            Some(reference) => format!("Notarization Result: {}", reference),
            None => FAILURE_MARKER.to_string(),
        };

        vec![
            format!("File Name: {}", self.file_name),
            format!("File Size: {} bytes", self.size_bytes),
            format!("Timestamp: {}", self.modified.format("%a %b %e %H:%M:%S %Y")),
            format!("Hash ({}, hex): {}", self.digest.algorithm, self.digest.hex_value),
            result,
        ]
    }
}

/// `<stem>_receipt.<extension>`
pub fn receipt_file_name(input: &Path, extension: &str) -> NotarizerResult<String> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| NotarizerError::InvalidPath(input.display().to_string()))?;
    Ok(format!("{}_receipt.{}", stem, extension))
}

/// Turns a receipt into a document on disk
pub trait ReceiptRenderer: Send + Sync {
    /// File extension of the produced document, without the dot
    fn extension(&self) -> &'static str;

    fn render(&self, receipt: &Receipt, destination: &Path) -> NotarizerResult<()>;
}

/// Plain UTF-8 text, one field per line
pub struct TextReceiptRenderer;

impl ReceiptRenderer for TextReceiptRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, receipt: &Receipt, destination: &Path) -> NotarizerResult<()> {
        let mut body = String::new();
        body.push_str(receipt.title());
        body.push_str("\n\n");
        for line in receipt.lines() {
            body.push_str(&line);
            body.push('\n');
        }
        fs::write(destination, body)
            .map_err(|e| NotarizerError::ReceiptFailed(format!("{}: {}", destination.display(), e)))
    }
}

/// Single A4 page rendered with the built-in Helvetica fonts
pub struct PdfReceiptRenderer;

impl ReceiptRenderer for PdfReceiptRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, receipt: &Receipt, destination: &Path) -> NotarizerResult<()> {
        let (doc, page1, layer1) =
            PdfDocument::new(receipt.title(), Mm(210.0), Mm(297.0), "Layer 1");
        let layer = doc.get_page(page1).get_layer(layer1);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| NotarizerError::ReceiptFailed(format!("PDF font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| NotarizerError::ReceiptFailed(format!("PDF font error: {e}")))?;

        let mut y = Mm(280.0);
        layer.use_text(receipt.title(), 14.0, Mm(70.0), y, &bold);
        y -= Mm(20.0);

        for line in receipt.lines() {
            // Hex digests and transaction ids overflow the page width unwrapped.
            for chunk in wrap(&line, 80) {
                layer.use_text(chunk, 11.0, Mm(20.0), y, &font);
                y -= Mm(6.0);
            }
            y -= Mm(4.0);
        }

        let file = File::create(destination).map_err(|e| {
            NotarizerError::ReceiptFailed(format!("{}: {}", destination.display(), e))
        })?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| NotarizerError::ReceiptFailed(format!("PDF save error: {e}")))
    }
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

/// Writes receipts into the output directory
pub struct ReceiptWriter {
    output_dir: PathBuf,
    renderer: Box<dyn ReceiptRenderer>,
}

impl ReceiptWriter {
    pub fn new(output_dir: impl Into<PathBuf>, renderer: Box<dyn ReceiptRenderer>) -> Self {
        Self {
            output_dir: output_dir.into(),
            renderer,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the receipt for `input` ends up
    pub fn destination_for(&self, input: &Path) -> NotarizerResult<PathBuf> {
        Ok(self
            .output_dir
            .join(receipt_file_name(input, self.renderer.extension())?))
    }

    /// Render the receipt for `input` and return its path
    pub fn write(&self, input: &Path, receipt: &Receipt) -> NotarizerResult<PathBuf> {
        let destination = self.destination_for(input)?;
        self.renderer.render(receipt, &destination)?;
        Ok(destination)
    }
}
