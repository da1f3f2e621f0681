use std::path::{Path, PathBuf};

use crate::record::Year;

/// Directory of source calendars named `takvimi<year>.pdf`.
#[derive(Debug, Clone)]
pub struct PdfLibrary {
    dir: PathBuf,
}

impl PdfLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(year: Year) -> String {
        format!("takvimi{year}.pdf")
    }

    pub fn path_for(&self, year: Year) -> PathBuf {
        self.dir.join(Self::file_name(year))
    }

    pub fn exists(&self, year: Year) -> bool {
        self.path_for(year).is_file()
    }

    /// Year encoded in a file name, if it follows the naming scheme.
    pub fn parse_year(file_name: &str) -> Option<Year> {
        let digits = file_name.strip_prefix("takvimi")?.strip_suffix(".pdf")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Source files present, sorted by year. A missing directory yields an
    /// empty list.
    pub fn available(&self) -> std::io::Result<Vec<(Year, String)>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str()
                && let Some(year) = Self::parse_year(name)
            {
                found.push((year, name.to_string()));
            }
        }
        found.sort();
        Ok(found)
    }
}
