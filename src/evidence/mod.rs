pub mod hash;
pub mod receipt;
pub mod stability;

pub use hash::{FileDigest, HashAlgorithm, HASH_CHUNK_SIZE};
pub use receipt::{
    receipt_file_name, PdfReceiptRenderer, Receipt, ReceiptRenderer, ReceiptWriter,
    TextReceiptRenderer, FAILURE_MARKER, RECEIPT_TITLE,
};
pub use stability::{StabilityDetector, StabilityOutcome};
