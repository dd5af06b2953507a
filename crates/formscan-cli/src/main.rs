//! FormScan — OCR clinical assessment forms into structured records.

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Flags;

fn resolve_data_dir() -> PathBuf {
    std::env::var("FORMSCAN_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn print_help() {
    println!("FormScan — extract structured records from scanned assessment forms");
    println!();
    println!("Usage: formscan <command> [args]");
    println!();
    println!("Commands:");
    println!("  process <document> [--output <json>] [--no-store]");
    println!("                           OCR an image or PDF, parse it and store the record");
    println!("  parse <text-file> [--output <json>] [--no-store]");
    println!("                           Parse an existing OCR text dump");
    println!("  show <record-id>         Print a stored record");
    println!("  catalog                  Print the built-in rule catalog as JSON");
    println!("  help                     Show this help message");
    println!();
    println!("Environment:");
    println!("  FORMSCAN_DATA_DIR        Data directory (default: data/)");
    println!("  FORMSCAN_CATALOG         JSON rule catalog replacing the built-in one");
    println!("  FORMSCAN_TESSERACT_CMD   Tesseract executable (default: tesseract)");
    println!("  FORMSCAN_PDFTOPPM_CMD    pdftoppm executable (default: pdftoppm)");
    println!("  FORMSCAN_OCR_LANG        Tesseract language (default: eng)");
    println!("  FORMSCAN_PDF_DPI         PDF rasterization DPI (default: 300)");
    println!();
    println!("Exit status: 0 ok, 1 document could not be processed, 2 usage, 3 setup or storage failure");
}

fn usage_error(msg: &str) -> ! {
    eprintln!("{}", msg);
    eprintln!("Use 'formscan help' for usage.");
    std::process::exit(2);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_help();
        std::process::exit(2);
    };

    // Commands that need no configuration.
    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            return Ok(());
        }
        "catalog" => return commands::catalog(),
        "process" | "parse" | "show" => {}
        other => usage_error(&format!("Unknown command: {}", other)),
    }

    let Some(target) = args.get(2) else {
        usage_error(&format!("formscan {}: missing argument", command))
    };
    let flags = Flags::parse(&args[3..]).unwrap_or_else(|e| usage_error(&e));

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let config = formscan_core::FormScanConfig::from_env(&data_dir)?;

    let result = match command.as_str() {
        "process" => commands::process(&config, &PathBuf::from(target), &flags),
        "parse" => commands::parse(&config, &PathBuf::from(target), &flags),
        "show" => match target.parse::<i64>() {
            Ok(id) => commands::show(&config, id),
            Err(_) => usage_error(&format!("Invalid record id: {}", target)),
        },
        _ => unreachable!("command validated above"),
    };

    if let Err(e) = result {
        eprintln!("formscan: {:#}", e);
        let code = match e.downcast_ref::<formscan_core::Error>() {
            Some(err) if err.is_document_level() => 1,
            _ => 3,
        };
        std::process::exit(code);
    }
    Ok(())
}
