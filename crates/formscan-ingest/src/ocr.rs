//! Text production from scanned documents.
//!
//! `TextSource` is the boundary between document files and the extraction
//! engine. `TesseractCli` is the production implementation: images go straight
//! to `tesseract`; PDFs are rasterized with `pdftoppm` and recognised page by
//! page, with page texts joined in page order. `TextDump` reads text that was
//! recognised elsewhere.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::file::DocumentKind;
use formscan_core::{Error, OcrConfig, Result};

/// Produces the raw text of a document.
pub trait TextSource: Send + Sync {
    /// Recognise the text of the document at `path`.
    ///
    /// Fails with `NotFound` for unreadable paths and `UnsupportedFormat` for
    /// files that are neither images nor PDFs. The returned text may be empty.
    fn produce_text(&self, path: &Path) -> Result<String>;
}

/// Tesseract/Poppler command-line OCR.
pub struct TesseractCli {
    config: OcrConfig,
}

impl TesseractCli {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Verify the Tesseract binary runs. Returns its version line.
    pub fn probe(&self) -> Result<String> {
        let out = run(&self.config.tesseract_cmd, [OsStr::new("--version")])?;
        // Older releases print the banner on stderr.
        let banner = if out.stdout.trim().is_empty() {
            out.stderr
        } else {
            out.stdout
        };
        let version = banner.lines().next().unwrap_or("").trim().to_string();
        info!("OCR engine available: {}", version);
        Ok(version)
    }

    fn ocr_image(&self, image: &Path) -> Result<String> {
        let out = run(
            &self.config.tesseract_cmd,
            [
                image.as_os_str(),
                OsStr::new("stdout"),
                OsStr::new("-l"),
                OsStr::new(&self.config.language),
            ],
        )?;
        Ok(out.stdout)
    }

    /// Render every page of `pdf` into `out_dir`, returning page images in order.
    fn rasterize_pdf(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let dpi = self.config.pdf_dpi.to_string();
        let prefix = out_dir.join("page");
        run(
            &self.config.pdftoppm_cmd,
            [
                OsStr::new("-r"),
                OsStr::new(&dpi),
                OsStr::new("-png"),
                pdf.as_os_str(),
                prefix.as_os_str(),
            ],
        )?;

        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|path| page_number(&path).map(|n| (n, path)))
            .collect();
        pages.sort_by_key(|(n, _)| *n);

        if pages.is_empty() {
            return Err(Error::Ocr(format!(
                "{}: pdftoppm produced no pages",
                pdf.display()
            )));
        }
        Ok(pages.into_iter().map(|(_, path)| path).collect())
    }

    fn ocr_pdf(&self, pdf: &Path) -> Result<String> {
        let scratch = tempfile::TempDir::new()?;
        let pages = self.rasterize_pdf(pdf, scratch.path())?;
        debug!("Rasterized {} pages from {}", pages.len(), pdf.display());

        let mut texts = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            let text = self.ocr_image(page)?;
            if text.trim().is_empty() {
                warn!("No text recognised on page {} of {}", i + 1, pdf.display());
            }
            texts.push(text);
        }
        Ok(texts.join("\n"))
    }
}

impl TextSource for TesseractCli {
    fn produce_text(&self, path: &Path) -> Result<String> {
        let text = match DocumentKind::detect(path)? {
            DocumentKind::Image => self.ocr_image(path)?,
            DocumentKind::Pdf => self.ocr_pdf(path)?,
        };
        Ok(text.trim().to_string())
    }
}

/// Reads an existing OCR text dump instead of running an engine.
pub struct TextDump;

impl TextSource for TextDump {
    fn produce_text(&self, path: &Path) -> Result<String> {
        let raw = std::fs::read(path)
            .map_err(|e| Error::NotFound(format!("{}: {}", path.display(), e)))?;
        let text = String::from_utf8(raw).map_err(|e| {
            Error::InvalidInput(format!("{}: not valid UTF-8: {}", path.display(), e))
        })?;
        Ok(text.trim().to_string())
    }
}

struct Output {
    stdout: String,
    stderr: String,
}

fn run<'a>(program: &Path, args: impl IntoIterator<Item = &'a OsStr>) -> Result<Output> {
    let output = Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::Ocr(format!(
                "{} is not installed or not on PATH",
                program.display()
            ))
        } else {
            Error::Ocr(format!("failed to run {}: {}", program.display(), e))
        }
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(Error::Ocr(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8(output.stdout).map_err(|e| {
        Error::InvalidInput(format!(
            "{} produced text that is not valid UTF-8: {}",
            program.display(),
            e
        ))
    })?;
    Ok(Output { stdout, stderr })
}

/// `page-7.png` / `page-07.png` → 7.
fn page_number(path: &Path) -> Option<u32> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("page-")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number() {
        assert_eq!(page_number(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number(Path::new("/tmp/x/page-012.png")), Some(12));
        assert_eq!(page_number(Path::new("/tmp/x/page-2.ppm")), None);
        assert_eq!(page_number(Path::new("/tmp/x/cover.png")), None);
    }

    #[test]
    fn test_text_dump() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scan.txt");
        std::fs::write(&path, "\n  Stairs: 3\n\n").unwrap();
        assert_eq!(TextDump.produce_text(&path).unwrap(), "Stairs: 3");

        std::fs::write(&path, [0x53, 0xff, 0xfe]).unwrap();
        let err = TextDump.produce_text(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = TextDump.produce_text(&dir.path().join("gone.txt")).unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m.contains("gone.txt")));
    }

    #[test]
    fn test_missing_binary_is_ocr_error() {
        let cli = TesseractCli::new(OcrConfig {
            tesseract_cmd: PathBuf::from("/nonexistent/bin/tesseract-formscan"),
            ..OcrConfig::default()
        });
        let err = cli.probe().unwrap_err();
        assert!(matches!(err, Error::Ocr(ref m) if m.contains("not installed")));
    }

    #[test]
    fn test_missing_file_reported_before_engine_runs() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = TesseractCli::new(OcrConfig {
            tesseract_cmd: PathBuf::from("/nonexistent/bin/tesseract-formscan"),
            ..OcrConfig::default()
        });
        let err = cli.produce_text(&dir.path().join("lost.png")).unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m.contains("lost.png")));
    }

    #[test]
    fn test_unsupported_file_rejected_before_ocr() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Patient Name : Jane Doe").unwrap();

        let cli = TesseractCli::new(OcrConfig {
            tesseract_cmd: PathBuf::from("/nonexistent/bin/tesseract-formscan"),
            ..OcrConfig::default()
        });
        let err = cli.produce_text(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
