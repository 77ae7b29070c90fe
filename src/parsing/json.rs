//! JSON donor pools and search requests.

use std::path::Path;

use serde::Deserialize;

use crate::catalog::store::read_maybe_gzipped;
use crate::core::donor::DonorRecord;
use crate::parsing::ParseError;
use crate::search::request::SearchRequest;
use crate::utils::validation::MAX_DONORS;

/// Donor files are either a bare array or an object with a `donors` array
#[derive(Deserialize)]
#[serde(untagged)]
enum DonorDocument {
    List(Vec<DonorRecord>),
    Wrapped { donors: Vec<DonorRecord> },
}

/// Read donor records from a JSON file (`.gz` aware)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or a parse error
/// from [`parse_donors_json`].
pub fn parse_donors_file(path: &Path) -> Result<Vec<DonorRecord>, ParseError> {
    let content = read_maybe_gzipped(path)?;
    parse_donors_json(&content)
}

/// Parse donor records from JSON text
///
/// # Errors
///
/// Returns `ParseError::Json` for malformed JSON and
/// `ParseError::TooManyDonors` if the limit is exceeded.
pub fn parse_donors_json(text: &str) -> Result<Vec<DonorRecord>, ParseError> {
    let donors = match serde_json::from_str::<DonorDocument>(text) {
        Ok(DonorDocument::List(donors) | DonorDocument::Wrapped { donors }) => donors,
        // The untagged error hides the cause; reparse as a list to report it
        Err(_) => serde_json::from_str::<Vec<DonorRecord>>(text)?,
    };

    if donors.len() > MAX_DONORS {
        return Err(ParseError::TooManyDonors(donors.len()));
    }
    Ok(donors)
}

/// Read a search request from a JSON file (`.gz` aware)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read and
/// `ParseError::Json` if it is not a valid request.
pub fn parse_request_file(path: &Path) -> Result<SearchRequest, ParseError> {
    let content = read_maybe_gzipped(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DonorType;
    use std::io::Write;

    const DONORS: &str = r#"[
        {
            "id": "D1",
            "donor_type": "adult",
            "last_updated": "2024-01-01T00:00:00Z",
            "hla": {
                "a": { "position_1": "01:01", "position_2": "02:01" },
                "drb1": { "position_1": "15:01" }
            }
        },
        {
            "id": "D2",
            "donor_type": "cord",
            "last_updated": "2024-06-30T12:00:00Z",
            "is_available_for_search": false,
            "hla": {}
        }
    ]"#;

    #[test]
    fn test_parse_donor_list() {
        let donors = parse_donors_json(DONORS).unwrap();
        assert_eq!(donors.len(), 2);

        let d1 = &donors[0];
        assert_eq!(d1.id.0, "D1");
        assert!(d1.is_available_for_search);
        assert_eq!(d1.hla.a.position_2.as_deref(), Some("02:01"));
        assert_eq!(d1.hla.drb1.position_2, None);
        assert!(!d1.hla.b.is_typed());

        assert_eq!(donors[1].donor_type, DonorType::Cord);
        assert!(!donors[1].is_available_for_search);
    }

    #[test]
    fn test_parse_wrapped_donors() {
        let wrapped = format!(r#"{{ "donors": {DONORS} }}"#);
        assert_eq!(parse_donors_json(&wrapped).unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_donor_reports_json_error() {
        let err = parse_donors_json(r#"[{ "id": "D1" }]"#).unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn test_parse_gzipped_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut file = tempfile::Builder::new().suffix(".json.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(DONORS.as_bytes()).unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();

        let donors = parse_donors_file(file.path()).unwrap();
        assert_eq!(donors.len(), 2);
    }
}
