//! Input document classification.

use std::path::Path;

use formscan_core::{Error, Result};

/// Document types the OCR boundary accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// Detect document type from extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" | "webp" | "pnm" | "pbm"
            | "pgm" | "ppm" => Some(Self::Image),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Check that `path` is a readable file of a supported type.
    pub fn detect(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("{}: no such file", path.display())));
        }
        if !path.is_file() {
            return Err(Error::NotFound(format!("{}: not a regular file", path.display())));
        }
        std::fs::File::open(path)
            .map_err(|e| Error::NotFound(format!("{}: {}", path.display(), e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| {
            let shown = if ext.is_empty() {
                "no extension".to_string()
            } else {
                format!("'.{}'", ext)
            };
            Error::UnsupportedFormat(format!(
                "{}: {} is neither an image nor a PDF",
                path.display(),
                shown
            ))
        })
    }
}
