//! Readers for donor pools and search requests.
//!
//! - **JSON** (`.json`, `.json.gz`): an array of donor records, or a search request
//! - **TSV/CSV** (`.tsv`, `.csv`, optionally `.gz`): one donor per line
//!
//! ## Donor TSV columns
//!
//! | Column | Content |
//! |--------|---------|
//! | `donor_id` | Registry identifier |
//! | `donor_type` | `adult` or `cord` |
//! | `last_updated` | RFC 3339 timestamp |
//! | `available` | `true`/`false`, empty means available |
//! | `A_1` … `DRB1_2` | Raw typing per locus and position, empty when untyped |
//!
//! ## Example
//!
//! ```rust,no_run
//! use hla_match::parsing::load_donor_pool;
//! use std::path::Path;
//!
//! let pool = load_donor_pool(Path::new("donors.tsv")).unwrap();
//! println!("{} donors", pool.len());
//! ```

pub mod json;
pub mod tsv;

use std::path::Path;

use thiserror::Error;

use crate::core::donor::DonorRecord;
use crate::search::source::DonorPool;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid donor file format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Too many donors: {0} exceeds maximum allowed")]
    TooManyDonors(usize),
}

/// Donor file layouts recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonorFileFormat {
    Json,
    Tsv,
    Csv,
}

impl DonorFileFormat {
    /// Detect the format from the file name, looking through a `.gz` suffix
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        let extension = Path::new(name).extension()?.to_str()?;
        match extension {
            "json" => Some(Self::Json),
            "tsv" | "txt" => Some(Self::Tsv),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Read donor records from a JSON, TSV or CSV file
///
/// # Errors
///
/// Returns `ParseError::UnsupportedFormat` for unknown extensions, and read or
/// parse errors from the format-specific reader.
pub fn parse_donor_file(path: &Path) -> Result<Vec<DonorRecord>, ParseError> {
    match DonorFileFormat::from_path(path) {
        Some(DonorFileFormat::Json) => json::parse_donors_file(path),
        Some(DonorFileFormat::Tsv) => tsv::parse_donors_file(path, '\t'),
        Some(DonorFileFormat::Csv) => tsv::parse_donors_file(path, ','),
        None => Err(ParseError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Read a donor file into an in-memory donor source
///
/// # Errors
///
/// See [`parse_donor_file`].
pub fn load_donor_pool(path: &Path) -> Result<DonorPool, ParseError> {
    Ok(DonorPool::new(parse_donor_file(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        let detect = |name: &str| DonorFileFormat::from_path(Path::new(name));
        assert_eq!(detect("donors.json"), Some(DonorFileFormat::Json));
        assert_eq!(detect("donors.JSON.gz"), Some(DonorFileFormat::Json));
        assert_eq!(detect("/data/donors.tsv.gz"), Some(DonorFileFormat::Tsv));
        assert_eq!(detect("donors.csv"), Some(DonorFileFormat::Csv));
        assert_eq!(detect("donors.bam"), None);
        assert_eq!(detect("donors"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_donor_file(Path::new("donors.xlsx")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(_)));
    }
}
