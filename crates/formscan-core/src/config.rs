//! Configuration and data directory management.
//!
//! Everything deployment-specific (OCR binary locations, language packs,
//! database location) is resolved once at process start and handed to the
//! crates that need it. The extraction engine itself takes no configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Paths to all FormScan data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db: PathBuf,
    /// Default location for rendered JSON records (`data/output/`).
    pub output: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            output: root.join("output"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.db)?;
        std::fs::create_dir_all(&self.output)?;
        Ok(())
    }
}

/// External OCR tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract executable. A bare name is looked up on `PATH`.
    pub tesseract_cmd: PathBuf,
    /// Poppler's `pdftoppm`, used to rasterize PDF pages.
    pub pdftoppm_cmd: PathBuf,
    /// Tesseract language string, e.g. `eng` or `eng+fra`.
    pub language: String,
    /// Rasterization resolution for PDF pages.
    pub pdf_dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            pdftoppm_cmd: PathBuf::from("pdftoppm"),
            language: "eng".to_string(),
            pdf_dpi: 300,
        }
    }
}

impl OcrConfig {
    /// Resolve from `FORMSCAN_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary key lookup. Unset or blank keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let pdf_dpi = match get("FORMSCAN_PDF_DPI") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(dpi) if (72..=1200).contains(&dpi) => dpi,
                _ => {
                    return Err(Error::Config(format!(
                        "FORMSCAN_PDF_DPI must be an integer between 72 and 1200, got {:?}",
                        raw
                    )))
                }
            },
            None => defaults.pdf_dpi,
        };

        Ok(Self {
            tesseract_cmd: get("FORMSCAN_TESSERACT_CMD")
                .map(PathBuf::from)
                .unwrap_or(defaults.tesseract_cmd),
            pdftoppm_cmd: get("FORMSCAN_PDFTOPPM_CMD")
                .map(PathBuf::from)
                .unwrap_or(defaults.pdftoppm_cmd),
            language: get("FORMSCAN_OCR_LANG").unwrap_or(defaults.language),
            pdf_dpi,
        })
    }
}

/// Top-level FormScan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormScanConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// OCR collaborator settings.
    pub ocr: OcrConfig,
    /// Optional JSON rule catalog replacing the built-in one.
    pub catalog_path: Option<PathBuf>,
}

impl FormScanConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;
        let ocr = OcrConfig::from_env()?;
        let catalog_path = std::env::var("FORMSCAN_CATALOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        if let Some(path) = &catalog_path {
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "FORMSCAN_CATALOG points to {}, which is not a readable file",
                    path.display()
                )));
            }
        }

        tracing::debug!(
            "Configuration resolved: tesseract={}, lang={}, dpi={}",
            ocr.tesseract_cmd.display(),
            ocr.language,
            ocr.pdf_dpi
        );

        Ok(Self {
            data_paths,
            ocr,
            catalog_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = OcrConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, OcrConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cfg = OcrConfig::from_lookup(lookup(&[
            ("FORMSCAN_TESSERACT_CMD", "/opt/tesseract/bin/tesseract"),
            ("FORMSCAN_OCR_LANG", "eng+fra"),
            ("FORMSCAN_PDF_DPI", "200"),
        ]))
        .unwrap();
        assert_eq!(cfg.tesseract_cmd, PathBuf::from("/opt/tesseract/bin/tesseract"));
        assert_eq!(cfg.pdftoppm_cmd, PathBuf::from("pdftoppm"));
        assert_eq!(cfg.language, "eng+fra");
        assert_eq!(cfg.pdf_dpi, 200);
    }

    #[test]
    fn test_blank_value_keeps_default() {
        let cfg = OcrConfig::from_lookup(lookup(&[("FORMSCAN_OCR_LANG", "  ")])).unwrap();
        assert_eq!(cfg.language, "eng");
    }

    #[test]
    fn test_bad_dpi_fails_fast() {
        let err = OcrConfig::from_lookup(lookup(&[("FORMSCAN_PDF_DPI", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = OcrConfig::from_lookup(lookup(&[("FORMSCAN_PDF_DPI", "10")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_data_paths_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = DataPaths::new(dir.path().join("data")).unwrap();
        assert!(paths.db.is_dir());
        assert!(paths.output.is_dir());
    }
}
