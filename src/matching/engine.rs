use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::core::donor::{DonorCandidate, DonorId};
use crate::core::phenotype::LociInfo;
use crate::core::types::{DonorType, Locus};
use crate::matching::aggregate::{aggregate, ScoreAggregate};
use crate::matching::criteria::{MatchCriteria, MatchVerdict};
use crate::matching::expansion::ExpandedPhenotype;
use crate::matching::locus::{match_locus, LocusMatchDetails};
use crate::matching::scoring::{score_locus, LocusScoreDetails};

/// Locus match counts for the loci included in matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// One entry per matched locus, `None` for loci not matched on
    pub loci: LociInfo<Option<LocusMatchDetails>>,

    pub total_match_count: u8,

    pub total_mismatch_count: u8,

    /// Matched loci the donor is typed at
    pub typed_loci_count: usize,
}

impl MatchResult {
    pub fn from_loci(loci: LociInfo<Option<LocusMatchDetails>>) -> Self {
        let matched = || loci.iter().filter_map(|(_, details)| details.as_ref());
        let total_match_count = matched().map(|d| d.match_count).sum();
        let total_mismatch_count = matched().map(LocusMatchDetails::mismatch_count).sum();
        let typed_loci_count = matched().filter(|d| d.is_locus_typed).count();

        Self {
            loci,
            total_match_count,
            total_mismatch_count,
            typed_loci_count,
        }
    }

    pub fn locus(&self, locus: Locus) -> Option<&LocusMatchDetails> {
        self.loci.get(locus).as_ref()
    }
}

/// Position scores for the scored loci, independent of matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    /// One entry per scored locus, `None` for loci not scored
    pub loci: LociInfo<Option<LocusScoreDetails>>,

    /// Absent when no locus is scored
    pub aggregate: Option<ScoreAggregate>,
}

impl ScoreResult {
    pub fn locus(&self, locus: Locus) -> Option<&LocusScoreDetails> {
        self.loci.get(locus).as_ref()
    }
}

/// Outcome of evaluating one donor against a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonorEvaluation {
    pub donor_id: DonorId,
    pub donor_type: DonorType,
    pub match_result: MatchResult,
    pub verdict: MatchVerdict,
    /// Present for accepted donors only
    pub score_result: Option<ScoreResult>,
}

impl DonorEvaluation {
    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    /// Result ordering: accepted before rejected, more matches first, then the
    /// better aggregate category, grade score, confidence score and typed loci
    /// count. Donor id breaks remaining ties so the order is stable.
    pub fn cmp_rank(&self, other: &Self) -> Ordering {
        let summary = |e: &Self| e.score_result.as_ref().and_then(|s| s.aggregate);
        let key = |e: &Self| {
            let agg = summary(e);
            (
                e.is_accepted(),
                e.match_result.total_match_count,
                agg.map(|a| a.category),
                agg.map_or(0, |a| a.grade_score),
                agg.map_or(0, |a| a.confidence_score),
                agg.map_or(0, |a| a.typed_loci_count),
            )
        };

        key(other)
            .cmp(&key(self))
            .then_with(|| self.donor_id.cmp(&other.donor_id))
    }
}

/// Evaluates donors against one expanded patient and one set of criteria
pub struct MatchingEngine<'a> {
    patient: &'a ExpandedPhenotype,
    criteria: &'a MatchCriteria,
}

impl<'a> MatchingEngine<'a> {
    pub fn new(patient: &'a ExpandedPhenotype, criteria: &'a MatchCriteria) -> Self {
        Self { patient, criteria }
    }

    pub fn criteria(&self) -> &MatchCriteria {
        self.criteria
    }

    /// Count matches at every locus included in matching
    pub fn match_donor(&self, donor: &DonorCandidate) -> MatchResult {
        let loci = LociInfo::from_fn(|locus| {
            self.criteria
                .is_matched(locus)
                .then(|| match_locus(self.patient.get(locus), donor.phenotype.get(locus)))
        });
        MatchResult::from_loci(loci)
    }

    /// Score every locus in the criteria's scoring list
    pub fn score_donor(&self, donor: &DonorCandidate) -> ScoreResult {
        let loci_to_score = self.criteria.loci_to_score();
        let loci = LociInfo::from_fn(|locus| {
            loci_to_score
                .contains(&locus)
                .then(|| score_locus(locus, self.patient.get(locus), donor.phenotype.get(locus)))
        });
        let aggregate = aggregate(
            &loci,
            loci_to_score,
            self.criteria.loci_excluded_from_aggregate(),
        );
        ScoreResult { loci, aggregate }
    }

    /// Match, filter and, when accepted, score one donor
    pub fn evaluate(&self, donor: &DonorCandidate) -> DonorEvaluation {
        let match_result = self.match_donor(donor);
        let verdict = self.criteria.evaluate(&match_result);

        let score_result = match verdict {
            MatchVerdict::Accept => Some(self.score_donor(donor)),
            MatchVerdict::Reject(reason) => {
                debug!("Donor {} rejected: {}", donor.id, reason);
                None
            }
        };

        DonorEvaluation {
            donor_id: donor.id.clone(),
            donor_type: donor.donor_type,
            match_result,
            verdict,
            score_result,
        }
    }
}
