//! Show what the normalizer and parser make of raw OCR text.
//!
//! Handy while writing a noise catalogue for a new app or language:
//!
//!     tesseract shot.png stdout | normalize_text --catalogue my_app.toml

use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use songshot::{parse_with_separator, Normalizer, NormalizerConfig};

#[derive(Debug, Parser)]
#[command(name = "normalize_text", version, about = "Normalize raw OCR text and list the songs found")]
struct Cli {
    /// Text file to read (stdin when omitted)
    input: Option<PathBuf>,

    /// TOML file with separator, locale and noise catalogue
    #[arg(long, value_name = "FILE")]
    catalogue: Option<PathBuf>,

    /// Print records as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let raw = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let normalizer = match &cli.catalogue {
        Some(path) => Normalizer::new(&NormalizerConfig::from_toml(&fs::read_to_string(path)?)?)?,
        None => Normalizer::french(),
    };

    let cleaned = normalizer.normalize(&raw);
    let records = parse_with_separator(&cleaned, normalizer.separator());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("Cleaned OCR text (with separators):");
    println!("{}", cleaned);
    println!();
    println!("{} song(s):", records.len());
    for record in &records {
        println!("  Title : {} / Artist : {}", record.display_title(), record.display_artist());
    }
    Ok(())
}
