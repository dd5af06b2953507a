//! FormScan Ingest — document → text → record → store.
//!
//! Text production sits behind the [`TextSource`] trait. [`TesseractCli`]
//! drives the Tesseract and Poppler command-line tools; tests and callers with
//! pre-recognised text can plug in their own source.

pub mod file;
pub mod ingest;
pub mod ocr;

pub use file::DocumentKind;
pub use ingest::{text_hash, FormIngester, IngestOutcome};
pub use ocr::{TesseractCli, TextDump, TextSource};
