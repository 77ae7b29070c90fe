use std::path::Path;

use chrono::{DateTime, Utc};

use crate::catalog::store::read_maybe_gzipped;
use crate::core::donor::DonorRecord;
use crate::core::phenotype::{LociInfo, LocusInfo, RawPhenotype};
use crate::core::types::{DonorType, Locus};
use crate::parsing::ParseError;
use crate::utils::validation::check_donor_limit;

/// Identity columns ahead of the typings
const LEADING_COLUMNS: usize = 4;

/// Two typing columns per locus, in [`Locus::ALL`] order
const TYPING_COLUMNS: usize = 2 * Locus::ALL.len();

/// Parse a TSV/CSV donor file with columns:
/// `donor_id, donor_type, last_updated, available, A_1, A_2, ..., DRB1_2`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_donors_file(path: &Path, delimiter: char) -> Result<Vec<DonorRecord>, ParseError> {
    let content = read_maybe_gzipped(path)?;
    parse_donors_text(&content, delimiter)
}

/// Parse TSV/CSV donor text
///
/// Trailing typing columns may be omitted; missing or empty cells are untyped.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line lacks the identity columns,
/// has an unknown donor type, an unparseable timestamp or availability flag,
/// or too many columns, and `ParseError::TooManyDonors` if the limit is
/// exceeded.
pub fn parse_donors_text(text: &str, delimiter: char) -> Result<Vec<DonorRecord>, ParseError> {
    let mut donors = Vec::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();

        if first_data_line {
            first_data_line = false;
            let first = fields.first().map(|s| s.to_lowercase()).unwrap_or_default();
            if first == "donor_id" || first == "id" {
                continue;
            }
        }

        let line_num = i + 1;

        if fields.len() < LEADING_COLUMNS {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than {LEADING_COLUMNS} fields"
            )));
        }
        if fields.len() > LEADING_COLUMNS + TYPING_COLUMNS {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has more than {} fields",
                LEADING_COLUMNS + TYPING_COLUMNS
            )));
        }

        if check_donor_limit(donors.len()).is_some() {
            return Err(ParseError::TooManyDonors(donors.len()));
        }

        donors.push(parse_donor_line(&fields, line_num)?);
    }

    Ok(donors)
}

fn parse_donor_line(fields: &[&str], line_num: usize) -> Result<DonorRecord, ParseError> {
    let id = fields[0];
    if id.is_empty() {
        return Err(ParseError::InvalidFormat(format!(
            "Missing donor id on line {line_num}"
        )));
    }

    let donor_type = DonorType::parse(fields[1]).ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "Invalid donor type on line {}: '{}'",
            line_num, fields[1]
        ))
    })?;

    let last_updated = DateTime::parse_from_rfc3339(fields[2])
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid timestamp on line {}: '{}'",
                line_num, fields[2]
            ))
        })?;

    let available = parse_flag(fields[3]).ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "Invalid availability on line {}: '{}'",
            line_num, fields[3]
        ))
    })?;

    let typings = &fields[LEADING_COLUMNS..];
    let cell = |index: usize| {
        typings
            .get(index)
            .filter(|s| !s.is_empty())
            .map(|s| (*s).to_string())
    };
    let hla: RawPhenotype = LociInfo::from_fn(|locus| {
        let column = 2 * locus as usize;
        LocusInfo::new(cell(column), cell(column + 1))
    });

    let mut record = DonorRecord::new(id, donor_type, last_updated, hla);
    record.is_available_for_search = available;
    Ok(record)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "" | "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tsv_text() {
        let tsv = "donor_id\tdonor_type\tlast_updated\tavailable\tA_1\tA_2\tB_1\tB_2\n\
D1\tadult\t2024-01-01T00:00:00Z\ttrue\t01:01\t02:01\t07:02\t08:01\n\
D2\tcord\t2024-02-01T10:30:00+02:00\tno\t01:01\t\t\t\n";

        let donors = parse_donors_text(tsv, '\t').unwrap();
        assert_eq!(donors.len(), 2);
        assert_eq!(donors[0].id.0, "D1");
        assert_eq!(donors[0].hla.b.position_2.as_deref(), Some("08:01"));
        assert!(!donors[0].hla.drb1.is_typed());

        let d2 = &donors[1];
        assert_eq!(d2.donor_type, DonorType::Cord);
        assert!(!d2.is_available_for_search);
        assert_eq!(d2.hla.a.position_1.as_deref(), Some("01:01"));
        assert_eq!(d2.hla.a.position_2, None);
        assert_eq!(d2.last_updated.to_rfc3339(), "2024-02-01T08:30:00+00:00");
    }

    #[test]
    fn test_parse_csv_full_width() {
        let csv = "D1,adult,2024-01-01T00:00:00Z,,\
A*01:01,A*02:01,07:02,08:01,07:01,07:02,04:01,04:01,02:01,03:01,15:01,03:01\n";
        let donors = parse_donors_text(csv, ',').unwrap();
        assert_eq!(donors.len(), 1);
        assert!(donors[0].is_available_for_search);
        assert_eq!(donors[0].hla.c.position_1.as_deref(), Some("07:01"));
        assert_eq!(donors[0].hla.dpb1.position_2.as_deref(), Some("04:01"));
        assert_eq!(donors[0].hla.dqb1.position_2.as_deref(), Some("03:01"));
        assert_eq!(donors[0].hla.drb1.position_1.as_deref(), Some("15:01"));
    }

    #[test]
    fn test_comments_before_header() {
        let tsv = "# registry export\n\ndonor_id\tdonor_type\tlast_updated\tavailable\n\
D1\tadult\t2024-01-01T00:00:00Z\t1\n";
        let donors = parse_donors_text(tsv, '\t').unwrap();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].id.0, "D1");
    }

    #[test]
    fn test_invalid_lines() {
        let bad_type = "D1\tchild\t2024-01-01T00:00:00Z\ttrue\n";
        let err = parse_donors_text(bad_type, '\t').unwrap_err();
        assert!(err.to_string().contains("Invalid donor type on line 1"));

        let bad_time = "D1\tadult\tyesterday\ttrue\n";
        assert!(parse_donors_text(bad_time, '\t').is_err());

        let short = "D1\tadult\n";
        assert!(parse_donors_text(short, '\t').is_err());

        let wide = format!("D1\tadult\t2024-01-01T00:00:00Z\ttrue{}\n", "\t01:01".repeat(13));
        assert!(parse_donors_text(&wide, '\t').is_err());
    }

    #[test]
    fn test_empty_input_has_no_donors() {
        assert!(parse_donors_text("", '\t').unwrap().is_empty());
    }
}
