//! Search criteria: mismatch ceilings, scoring loci and donor eligibility.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::core::donor::DonorRecord;
use crate::core::phenotype::LociInfo;
use crate::core::types::{DonorType, Locus};
use crate::matching::engine::MatchResult;

/// Most mismatches a single locus can carry
pub const MAX_LOCUS_MISMATCHES: u8 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("{locus} mismatch ceiling {ceiling} is outside 0..=2")]
    LocusCeilingOutOfRange { locus: Locus, ceiling: u8 },

    #[error("Total mismatch ceiling {ceiling} exceeds {max} for the matched loci")]
    TotalCeilingOutOfRange { ceiling: u8, max: u8 },

    #[error("No loci selected for matching")]
    NoMatchedLoci,
}

/// Why a donor failed the mismatch ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    LocusMismatches { locus: Locus, mismatches: u8, allowed: u8 },
    TotalMismatches { mismatches: u8, allowed: u8 },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocusMismatches {
                locus,
                mismatches,
                allowed,
            } => write!(f, "{mismatches} mismatches at {locus} (allowed {allowed})"),
            Self::TotalMismatches {
                mismatches,
                allowed,
            } => write!(f, "{mismatches} mismatches in total (allowed {allowed})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum MatchVerdict {
    Accept,
    Reject(RejectReason),
}

impl MatchVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Validated, immutable search criteria.
///
/// Built through [`MatchCriteria::builder`]; a value that exists has every
/// ceiling in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCriteria {
    donor_type: DonorType,
    locus_ceilings: LociInfo<Option<u8>>,
    total_ceiling: u8,
    loci_to_score: BTreeSet<Locus>,
    loci_excluded_from_aggregate: BTreeSet<Locus>,
}

impl MatchCriteria {
    pub fn builder(donor_type: DonorType) -> MatchCriteriaBuilder {
        MatchCriteriaBuilder::new(donor_type)
    }

    pub fn donor_type(&self) -> DonorType {
        self.donor_type
    }

    /// Mismatch ceiling at `locus`, `None` when the locus is not matched on
    pub fn locus_ceiling(&self, locus: Locus) -> Option<u8> {
        *self.locus_ceilings.get(locus)
    }

    pub fn is_matched(&self, locus: Locus) -> bool {
        self.locus_ceiling(locus).is_some()
    }

    /// Loci included in matching, in locus order
    pub fn matched_loci(&self) -> impl Iterator<Item = Locus> + '_ {
        Locus::ALL.into_iter().filter(|l| self.is_matched(*l))
    }

    pub fn total_ceiling(&self) -> u8 {
        self.total_ceiling
    }

    pub fn loci_to_score(&self) -> &BTreeSet<Locus> {
        &self.loci_to_score
    }

    pub fn loci_excluded_from_aggregate(&self) -> &BTreeSet<Locus> {
        &self.loci_excluded_from_aggregate
    }

    /// Accept or reject a donor's match result.
    ///
    /// Every matched locus must reach `2 - ceiling` matches and the mismatches
    /// summed over matched loci must stay within the total ceiling. Loci that
    /// are only scored never affect the verdict.
    pub fn evaluate(&self, result: &MatchResult) -> MatchVerdict {
        let mut total = 0u8;
        for locus in self.matched_loci() {
            let allowed = self.locus_ceiling(locus).unwrap_or(MAX_LOCUS_MISMATCHES);
            // A matched locus missing from the result was never compared
            let mismatches = result
                .locus(locus)
                .map_or(0, |details| details.mismatch_count());
            if mismatches > allowed {
                return MatchVerdict::Reject(RejectReason::LocusMismatches {
                    locus,
                    mismatches,
                    allowed,
                });
            }
            total += mismatches;
        }

        if total > self.total_ceiling {
            return MatchVerdict::Reject(RejectReason::TotalMismatches {
                mismatches: total,
                allowed: self.total_ceiling,
            });
        }
        MatchVerdict::Accept
    }
}

/// Consuming builder for [`MatchCriteria`]
#[derive(Debug, Clone)]
pub struct MatchCriteriaBuilder {
    donor_type: DonorType,
    locus_ceilings: LociInfo<Option<u8>>,
    total_ceiling: Option<u8>,
    loci_to_score: BTreeSet<Locus>,
    loci_excluded_from_aggregate: BTreeSet<Locus>,
}

impl MatchCriteriaBuilder {
    fn new(donor_type: DonorType) -> Self {
        Self {
            donor_type,
            locus_ceilings: LociInfo::default(),
            total_ceiling: None,
            loci_to_score: BTreeSet::new(),
            loci_excluded_from_aggregate: BTreeSet::new(),
        }
    }

    /// Match on `locus`, allowing up to `ceiling` mismatches there
    #[must_use]
    pub fn locus(mut self, locus: Locus, ceiling: u8) -> Self {
        let slot = match locus {
            Locus::A => &mut self.locus_ceilings.a,
            Locus::B => &mut self.locus_ceilings.b,
            Locus::C => &mut self.locus_ceilings.c,
            Locus::Dpb1 => &mut self.locus_ceilings.dpb1,
            Locus::Dqb1 => &mut self.locus_ceilings.dqb1,
            Locus::Drb1 => &mut self.locus_ceilings.drb1,
        };
        *slot = Some(ceiling);
        self
    }

    /// Total mismatches allowed across matched loci; defaults to the sum of
    /// the per-locus ceilings
    #[must_use]
    pub fn total_mismatches(mut self, ceiling: u8) -> Self {
        self.total_ceiling = Some(ceiling);
        self
    }

    #[must_use]
    pub fn score_loci(mut self, loci: impl IntoIterator<Item = Locus>) -> Self {
        self.loci_to_score.extend(loci);
        self
    }

    #[must_use]
    pub fn exclude_from_aggregate(mut self, loci: impl IntoIterator<Item = Locus>) -> Self {
        self.loci_excluded_from_aggregate.extend(loci);
        self
    }

    /// Validate and freeze the criteria
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError` when no locus is matched, a per-locus ceiling
    /// exceeds 2, or the total ceiling exceeds twice the number of matched loci.
    pub fn build(self) -> Result<MatchCriteria, CriteriaError> {
        let mut matched = 0u8;
        let mut ceiling_sum = 0u8;
        for (locus, ceiling) in self.locus_ceilings.iter() {
            if let Some(ceiling) = *ceiling {
                if ceiling > MAX_LOCUS_MISMATCHES {
                    return Err(CriteriaError::LocusCeilingOutOfRange { locus, ceiling });
                }
                matched += 1;
                ceiling_sum += ceiling;
            }
        }
        if matched == 0 {
            return Err(CriteriaError::NoMatchedLoci);
        }

        let max = matched * MAX_LOCUS_MISMATCHES;
        let total_ceiling = self.total_ceiling.unwrap_or(ceiling_sum);
        if total_ceiling > max {
            return Err(CriteriaError::TotalCeilingOutOfRange {
                ceiling: total_ceiling,
                max,
            });
        }

        Ok(MatchCriteria {
            donor_type: self.donor_type,
            locus_ceilings: self.locus_ceilings,
            total_ceiling,
            loci_to_score: self.loci_to_score,
            loci_excluded_from_aggregate: self.loci_excluded_from_aggregate,
        })
    }
}

/// Eligibility of a donor record for a search, checked before any expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonorFilter {
    pub donor_type: DonorType,
    /// Only donors updated at or before this instant are eligible
    pub updated_cutoff: Option<DateTime<Utc>>,
}

impl DonorFilter {
    pub fn new(donor_type: DonorType, updated_cutoff: Option<DateTime<Utc>>) -> Self {
        Self {
            donor_type,
            updated_cutoff,
        }
    }

    pub fn admits(&self, donor: &DonorRecord) -> bool {
        donor.is_available_for_search
            && donor.donor_type == self.donor_type
            && self
                .updated_cutoff
                .map_or(true, |cutoff| donor.last_updated <= cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phenotype::RawPhenotype;
    use crate::matching::locus::{LocusMatchDetails, MatchOrientations};
    use chrono::{Duration, TimeZone};

    fn result_with(counts: &[(Locus, u8)]) -> MatchResult {
        let loci = LociInfo::from_fn(|locus| {
            counts
                .iter()
                .find(|(l, _)| *l == locus)
                .map(|&(_, match_count)| LocusMatchDetails {
                    match_count,
                    orientations: MatchOrientations::Both,
                    is_locus_typed: true,
                })
        });
        MatchResult::from_loci(loci)
    }

    fn six_of_six(ceiling: u8) -> MatchCriteria {
        MatchCriteria::builder(DonorType::Adult)
            .locus(Locus::A, ceiling)
            .locus(Locus::B, ceiling)
            .locus(Locus::Drb1, ceiling)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults_total_to_ceiling_sum() {
        let criteria = MatchCriteria::builder(DonorType::Cord)
            .locus(Locus::A, 1)
            .locus(Locus::B, 0)
            .locus(Locus::Drb1, 1)
            .build()
            .unwrap();
        assert_eq!(criteria.total_ceiling(), 2);
        assert_eq!(
            criteria.matched_loci().collect::<Vec<_>>(),
            vec![Locus::A, Locus::B, Locus::Drb1]
        );
        assert!(!criteria.is_matched(Locus::C));
    }

    #[test]
    fn test_builder_rejects_out_of_range() {
        let err = MatchCriteria::builder(DonorType::Adult)
            .locus(Locus::A, 3)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            CriteriaError::LocusCeilingOutOfRange {
                locus: Locus::A,
                ceiling: 3
            }
        );

        let err = MatchCriteria::builder(DonorType::Adult)
            .locus(Locus::A, 0)
            .locus(Locus::B, 0)
            .total_mismatches(5)
            .build()
            .unwrap_err();
        assert_eq!(err, CriteriaError::TotalCeilingOutOfRange { ceiling: 5, max: 4 });

        assert_eq!(
            MatchCriteria::builder(DonorType::Adult).build().unwrap_err(),
            CriteriaError::NoMatchedLoci
        );
    }

    #[test]
    fn test_evaluate_locus_ceiling() {
        let result = result_with(&[(Locus::A, 2), (Locus::B, 1), (Locus::Drb1, 2)]);
        assert_eq!(
            six_of_six(0).evaluate(&result),
            MatchVerdict::Reject(RejectReason::LocusMismatches {
                locus: Locus::B,
                mismatches: 1,
                allowed: 0
            })
        );
        assert!(six_of_six(1).evaluate(&result).is_accepted());
    }

    #[test]
    fn test_evaluate_total_ceiling() {
        let criteria = MatchCriteria::builder(DonorType::Adult)
            .locus(Locus::A, 1)
            .locus(Locus::B, 1)
            .locus(Locus::Drb1, 1)
            .total_mismatches(1)
            .build()
            .unwrap();
        let result = result_with(&[(Locus::A, 1), (Locus::B, 1), (Locus::Drb1, 2)]);
        assert_eq!(
            criteria.evaluate(&result),
            MatchVerdict::Reject(RejectReason::TotalMismatches {
                mismatches: 2,
                allowed: 1
            })
        );
    }

    #[test]
    fn test_unmatched_loci_never_gate() {
        let result = result_with(&[(Locus::A, 2), (Locus::B, 2), (Locus::C, 0), (Locus::Drb1, 2)]);
        assert!(six_of_six(0).evaluate(&result).is_accepted());
    }

    #[test]
    fn test_donor_filter() {
        let cutoff = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let donor = DonorRecord::new("D1", DonorType::Adult, cutoff, RawPhenotype::untyped());

        let filter = DonorFilter::new(DonorType::Adult, Some(cutoff));
        assert!(filter.admits(&donor));

        let later = DonorRecord {
            last_updated: cutoff + Duration::seconds(1),
            ..donor.clone()
        };
        assert!(!filter.admits(&later));
        assert!(DonorFilter::new(DonorType::Adult, None).admits(&later));

        assert!(!DonorFilter::new(DonorType::Cord, None).admits(&donor));
        assert!(!filter.admits(&donor.clone().unavailable()));
    }
}
