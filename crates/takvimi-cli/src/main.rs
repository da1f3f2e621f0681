use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use takvimi_core::{CacheStoreExt, FsStore, PdfLibrary, Year, YearDocument};
use takvimi_parsing::{ParsingConfig, YearAssembler, export_page, locate_months_in_pdf};
use takvimi_pdf_mupdf::MupdfBackend;

/// Takvimi - Extract Albanian prayer-time calendars from PDF
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a full year and print or persist it as JSON
    Extract {
        /// Path to the calendar PDF
        pdf: PathBuf,

        /// Calendar year (default: taken from a `takvimi<year>.pdf` file name)
        #[arg(long)]
        year: Option<Year>,

        /// Write `<year>.json` and `<year>/<MM>.json` here instead of printing
        #[arg(long)]
        json_dir: Option<PathBuf>,
    },

    /// Print the page range found for each month
    Locate {
        /// Path to the calendar PDF
        pdf: PathBuf,
    },

    /// Print one page's text rows as CSV
    Page {
        /// Path to the calendar PDF
        pdf: PathBuf,

        /// Page number, starting at 1
        page_num: usize,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "takvimi_parsing=info,takvimi_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Extract {
            pdf,
            year,
            json_dir,
        } => extract(&pdf, year, json_dir.as_deref()),
        Command::Locate { pdf } => locate(&pdf),
        Command::Page { pdf, page_num } => page(&pdf, page_num),
    }
}

fn extract(pdf: &Path, year: Option<Year>, json_dir: Option<&Path>) -> anyhow::Result<()> {
    let year = resolve_year(pdf, year)?;
    let assembler = YearAssembler::new(std::sync::Arc::new(MupdfBackend));
    let record = assembler
        .assemble_year(pdf, year)
        .with_context(|| format!("extracting {}", pdf.display()))?;

    match json_dir {
        Some(dir) => {
            FsStore::new(dir)
                .persist_year(year, &record)
                .with_context(|| format!("writing {}", dir.display()))?;
            eprintln!("Wrote year {year} to {}", dir.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &YearDocument::new(year, record))?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn locate(pdf: &Path) -> anyhow::Result<()> {
    let located = match locate_months_in_pdf(pdf, &MupdfBackend, &ParsingConfig::default()) {
        Ok(located) => located,
        Err(takvimi_parsing::LocateError::MonthNotFound { missing, located }) => {
            let names: Vec<String> = missing.iter().map(|m| m.key()).collect();
            eprintln!("No heading found for months: {}", names.join(", "));
            located
        }
        Err(e) => return Err(e.into()),
    };

    for (month, pages) in located.iter() {
        let numbers: Vec<String> = pages.iter().map(|p| (p + 1).to_string()).collect();
        println!("{month}: pages {}", numbers.join(", "));
    }
    Ok(())
}

fn page(pdf: &Path, page_num: usize) -> anyhow::Result<()> {
    let csv = export_page(pdf, page_num, &MupdfBackend, &ParsingConfig::default())?;
    print!("{csv}");
    Ok(())
}

fn resolve_year(pdf: &Path, year: Option<Year>) -> anyhow::Result<Year> {
    if let Some(year) = year {
        return Ok(year);
    }
    pdf.file_name()
        .and_then(|n| n.to_str())
        .and_then(PdfLibrary::parse_year)
        .with_context(|| {
            format!(
                "cannot infer the year from {}; pass --year",
                pdf.display()
            )
        })
}
