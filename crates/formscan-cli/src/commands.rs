//! Subcommand implementations.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use formscan_core::{Error, FormScanConfig};
use formscan_extract::{Catalog, PatternRegistry, StructuredRecord};
use formscan_ingest::{FormIngester, IngestOutcome, TesseractCli, TextDump, TextSource};
use formscan_store::FormStore;

/// Trailing options shared by `process` and `parse`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub output: Option<PathBuf>,
    pub no_store: bool,
}

impl Flags {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut flags = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--output" | "-o" => {
                    let path = iter
                        .next()
                        .ok_or_else(|| format!("{} requires a path", arg))?;
                    flags.output = Some(PathBuf::from(path));
                }
                "--no-store" => flags.no_store = true,
                other => return Err(format!("Unexpected argument: {}", other)),
            }
        }
        Ok(flags)
    }

    fn output_path(&self, config: &FormScanConfig) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| config.data_paths.output.join("output.json"))
    }
}

fn load_registry(config: &FormScanConfig) -> anyhow::Result<Cow<'static, PatternRegistry>> {
    match &config.catalog_path {
        Some(path) => {
            let registry = PatternRegistry::from_json_file(path)?;
            info!("Loaded {} rules from {}", registry.len(), path.display());
            Ok(Cow::Owned(registry))
        }
        None => Ok(Cow::Borrowed(PatternRegistry::standard())),
    }
}

fn open_store(config: &FormScanConfig) -> anyhow::Result<FormStore> {
    FormStore::open(&config.data_paths.db).context("Failed to open store")
}

fn write_record(record: &StructuredRecord, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, record.to_json_pretty()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn report(outcome: &IngestOutcome, output: &Path) {
    println!(
        "{} of {} fields recognised, written to {}",
        outcome.fields_present,
        outcome.fields_total,
        output.display()
    );
    if let Some(id) = outcome.record_id {
        println!("Stored as record {}", id);
    }
}

/// `process <document>`: OCR, parse, write JSON, store.
pub fn process(config: &FormScanConfig, document: &Path, flags: &Flags) -> anyhow::Result<()> {
    let ocr = TesseractCli::new(config.ocr.clone());
    ocr.probe()?;
    run(config, &ocr, document, flags)
}

fn run(
    config: &FormScanConfig,
    source: &dyn TextSource,
    document: &Path,
    flags: &Flags,
) -> anyhow::Result<()> {
    let registry = load_registry(config)?;
    let store = if flags.no_store {
        None
    } else {
        Some(open_store(config)?)
    };
    let mut ingester = FormIngester::new(source, &registry);
    if let Some(store) = &store {
        ingester = ingester.with_store(store);
    }

    let outcome = ingester.process_file(document)?;
    let output = flags.output_path(config);
    write_record(&outcome.record, &output)?;
    report(&outcome, &output);
    Ok(())
}

/// `parse <text-file>`: parse an existing OCR dump.
pub fn parse(config: &FormScanConfig, text_file: &Path, flags: &Flags) -> anyhow::Result<()> {
    run(config, &TextDump, text_file, flags)
}

/// `show <id>`: print a stored record.
pub fn show(config: &FormScanConfig, id: i64) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let form = store
        .get_form(id)?
        .ok_or_else(|| Error::NotFound(format!("record {}", id)))?;
    println!("{}", form.record.to_json_pretty()?);
    Ok(())
}

/// `catalog`: dump the built-in rule catalog.
pub fn catalog() -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&Catalog::standard())?);
    Ok(())
}
