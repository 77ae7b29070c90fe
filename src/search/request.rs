//! Search requests as submitted by callers, and their validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::phenotype::{LociInfo, LocusInfo, RawPhenotype};
use crate::core::types::{DonorType, Locus, LocusPosition};
use crate::matching::criteria::{CriteriaError, DonorFilter, MatchCriteria};
use crate::utils::validation::is_valid_nomenclature_version;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Match criteria must be given for locus {0}")]
    MissingMandatoryCriteria(Locus),

    #[error("Patient typing at {locus} position {position} is empty")]
    EmptySlot {
        locus: Locus,
        position: LocusPosition,
    },

    #[error("Locus {0} is matched on but the patient is not typed there")]
    UntypedMatchedLocus(Locus),

    #[error("Loci to score must be given (use an empty list to score nothing)")]
    MissingScoreLoci,

    #[error("Loci to exclude from the aggregate score must be given")]
    MissingExcludedLoci,

    #[error("Invalid nomenclature version: {0}")]
    InvalidNomenclatureVersion(String),

    #[error(transparent)]
    Criteria(#[from] CriteriaError),
}

/// A donor search request.
///
/// ```json
/// {
///   "donor_type": "adult",
///   "search_hla": {
///     "a": { "position_1": "01:01", "position_2": "02:01" },
///     "b": { "position_1": "07:02", "position_2": "08:01" },
///     "drb1": { "position_1": "15:01", "position_2": "03:01" }
///   },
///   "match_criteria": { "a": 0, "b": 1, "drb1": 0 },
///   "loci_to_score": ["A", "B", "C", "DRB1"],
///   "loci_to_exclude_from_aggregate_score": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub donor_type: DonorType,

    /// Pinned nomenclature version; the dictionary's latest when absent
    #[serde(default)]
    pub nomenclature_version: Option<String>,

    /// Patient typings; a present locus must carry both positions
    pub search_hla: LociInfo<Option<LocusInfo<Option<String>>>>,

    /// Per-locus mismatch ceilings; absent loci are not matched on
    pub match_criteria: LociInfo<Option<u8>>,

    #[serde(default)]
    pub total_mismatch_count: Option<u8>,

    #[serde(default)]
    pub loci_to_score: Option<Vec<Locus>>,

    #[serde(default)]
    pub loci_to_exclude_from_aggregate_score: Option<Vec<Locus>>,

    /// Only donors updated at or before this instant are searched
    #[serde(default)]
    pub donor_updated_cutoff: Option<DateTime<Utc>>,
}

/// A request that passed validation, split into what the search consumes
#[derive(Debug, Clone)]
pub struct ValidatedSearch {
    pub patient: RawPhenotype,
    pub criteria: MatchCriteria,
    pub filter: DonorFilter,
    pub nomenclature_version: Option<String>,
}

fn is_blank(slot: Option<&String>) -> bool {
    slot.map_or(true, |s| s.trim().is_empty())
}

impl SearchRequest {
    /// Validate the request and build its criteria
    ///
    /// # Errors
    ///
    /// Returns `RequestError` when mandatory criteria or lists are missing,
    /// a present patient locus has an empty slot, a matched locus is untyped
    /// in the patient, or the ceilings are out of range.
    pub fn validate(&self) -> Result<ValidatedSearch, RequestError> {
        for locus in Locus::MANDATORY {
            if self.match_criteria.get(locus).is_none() {
                return Err(RequestError::MissingMandatoryCriteria(locus));
            }
        }

        let loci_to_score = self
            .loci_to_score
            .as_ref()
            .ok_or(RequestError::MissingScoreLoci)?;
        let loci_excluded = self
            .loci_to_exclude_from_aggregate_score
            .as_ref()
            .ok_or(RequestError::MissingExcludedLoci)?;

        if let Some(version) = &self.nomenclature_version {
            if !is_valid_nomenclature_version(version) {
                return Err(RequestError::InvalidNomenclatureVersion(version.clone()));
            }
        }

        for (locus, slots) in self.search_hla.iter() {
            let Some(slots) = slots else { continue };
            for (position, value) in slots.iter() {
                if is_blank(value.as_ref()) {
                    return Err(RequestError::EmptySlot { locus, position });
                }
            }
        }

        for (locus, ceiling) in self.match_criteria.iter() {
            if ceiling.is_some() && self.search_hla.get(locus).is_none() {
                return Err(RequestError::UntypedMatchedLocus(locus));
            }
        }

        let mut builder = MatchCriteria::builder(self.donor_type)
            .score_loci(loci_to_score.iter().copied())
            .exclude_from_aggregate(loci_excluded.iter().copied());
        for (locus, ceiling) in self.match_criteria.iter() {
            if let Some(ceiling) = *ceiling {
                builder = builder.locus(locus, ceiling);
            }
        }
        if let Some(total) = self.total_mismatch_count {
            builder = builder.total_mismatches(total);
        }
        let criteria = builder.build()?;

        let patient = self
            .search_hla
            .map(|_, slots| slots.clone().unwrap_or_default());

        Ok(ValidatedSearch {
            patient,
            criteria,
            filter: DonorFilter::new(self.donor_type, self.donor_updated_cutoff),
            nomenclature_version: self.nomenclature_version.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_json(criteria: &str, extra: &str) -> String {
        format!(
            r#"{{
                "donor_type": "adult",
                "search_hla": {{
                    "a": {{ "position_1": "01:01", "position_2": "02:01" }},
                    "b": {{ "position_1": "07:02", "position_2": "08:01" }},
                    "drb1": {{ "position_1": "15:01", "position_2": "03:01" }}
                }},
                "match_criteria": {criteria}
                {extra}
            }}"#
        )
    }

    fn parse(criteria: &str, extra: &str) -> SearchRequest {
        serde_json::from_str(&request_json(criteria, extra)).unwrap()
    }

    const LISTS: &str = r#", "loci_to_score": ["A", "B", "C"], "loci_to_exclude_from_aggregate_score": []"#;

    #[test]
    fn test_valid_six_of_six() {
        let request = parse(r#"{ "a": 0, "b": 1, "drb1": 0 }"#, LISTS);
        let validated = request.validate().unwrap();

        assert_eq!(validated.criteria.locus_ceiling(Locus::B), Some(1));
        assert!(!validated.criteria.is_matched(Locus::C));
        assert_eq!(validated.criteria.total_ceiling(), 1);
        assert!(validated.criteria.loci_to_score().contains(&Locus::C));
        assert_eq!(validated.patient.a.position_1.as_deref(), Some("01:01"));
        assert!(!validated.patient.c.is_typed());
        assert_eq!(validated.filter.donor_type, DonorType::Adult);
        assert!(validated.filter.updated_cutoff.is_none());
    }

    #[test]
    fn test_mandatory_loci_required() {
        let request = parse(r#"{ "a": 0, "b": 0 }"#, LISTS);
        assert_eq!(
            request.validate().unwrap_err(),
            RequestError::MissingMandatoryCriteria(Locus::Drb1)
        );
    }

    #[test]
    fn test_matched_locus_must_be_typed() {
        // A 10/10 search needs C and DQB1 typings as well
        let request = parse(r#"{ "a": 0, "b": 0, "c": 0, "dqb1": 0, "drb1": 0 }"#, LISTS);
        assert_eq!(
            request.validate().unwrap_err(),
            RequestError::UntypedMatchedLocus(Locus::C)
        );
    }

    #[test]
    fn test_score_lists_required() {
        let request = parse(r#"{ "a": 0, "b": 0, "drb1": 0 }"#, "");
        assert_eq!(request.validate().unwrap_err(), RequestError::MissingScoreLoci);

        let request = parse(
            r#"{ "a": 0, "b": 0, "drb1": 0 }"#,
            r#", "loci_to_score": []"#,
        );
        assert_eq!(
            request.validate().unwrap_err(),
            RequestError::MissingExcludedLoci
        );
    }

    #[test]
    fn test_empty_slot_rejected() {
        let mut request = parse(r#"{ "a": 0, "b": 0, "drb1": 0 }"#, LISTS);
        request.search_hla.c = Some(LocusInfo::new(Some("07:01".to_string()), Some("  ".to_string())));
        assert_eq!(
            request.validate().unwrap_err(),
            RequestError::EmptySlot {
                locus: Locus::C,
                position: LocusPosition::Two,
            }
        );
    }

    #[test]
    fn test_criteria_errors_surface() {
        let request = parse(r#"{ "a": 3, "b": 0, "drb1": 0 }"#, LISTS);
        assert!(matches!(
            request.validate().unwrap_err(),
            RequestError::Criteria(CriteriaError::LocusCeilingOutOfRange { .. })
        ));

        let request = parse(
            r#"{ "a": 0, "b": 0, "drb1": 0 }"#,
            &format!(r#"{LISTS}, "total_mismatch_count": 7"#),
        );
        assert!(matches!(
            request.validate().unwrap_err(),
            RequestError::Criteria(CriteriaError::TotalCeilingOutOfRange { .. })
        ));
    }

    #[test]
    fn test_nomenclature_version_checked() {
        let request = parse(
            r#"{ "a": 0, "b": 0, "drb1": 0 }"#,
            &format!(r#"{LISTS}, "nomenclature_version": "latest""#),
        );
        assert_eq!(
            request.validate().unwrap_err(),
            RequestError::InvalidNomenclatureVersion("latest".to_string())
        );
    }
}
