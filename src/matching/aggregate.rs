//! Donor-level summary of position scores.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::phenotype::{LociInfo, LocusInfo};
use crate::core::types::{Locus, MatchCategory, MatchConfidence};
use crate::matching::scoring::{LocusScoreDetails, PositionScore};

/// Aggregate over the scored loci that count towards the donor summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreAggregate {
    pub category: MatchCategory,
    /// Sum of grade weights over contributing positions
    pub grade_score: u32,
    /// Sum of confidence weights over contributing positions
    pub confidence_score: u32,
    /// Scored, non-excluded loci the donor is typed at
    pub typed_loci_count: usize,
}

/// Position scores of loci that are scored, not excluded, and typed on both sides
fn contributing<'a>(
    scores: &'a LociInfo<Option<LocusScoreDetails>>,
    loci_to_score: &'a BTreeSet<Locus>,
    loci_excluded: &'a BTreeSet<Locus>,
) -> impl Iterator<Item = &'a LocusInfo<PositionScore>> + 'a {
    loci_to_score
        .iter()
        .filter(move |locus| !loci_excluded.contains(*locus))
        .filter_map(move |&locus| scores.get(locus).as_ref())
        .filter_map(|details| details.scores.as_ref())
}

/// Summarise scored loci into a single category.
///
/// Returns `None` when no locus is scored. A mismatch grade or mismatch
/// confidence at any contributing position makes the donor a mismatch;
/// otherwise the weakest confidence wins. With nothing typed to compare the donor is a potential match.
pub fn aggregate_category(
    scores: &LociInfo<Option<LocusScoreDetails>>,
    loci_to_score: &BTreeSet<Locus>,
    loci_excluded: &BTreeSet<Locus>,
) -> Option<MatchCategory> {
    if loci_to_score.is_empty() {
        return None;
    }

    let positions = || {
        contributing(scores, loci_to_score, loci_excluded)
            .flat_map(|locus| [locus.position_1, locus.position_2])
    };
    if positions().any(|score| score.grade.is_mismatch()) {
        return Some(MatchCategory::Mismatch);
    }
    let lowest = positions().map(|score| score.confidence).min();

    Some(match lowest {
        None => MatchCategory::Potential,
        Some(MatchConfidence::Mismatch) => MatchCategory::Mismatch,
        Some(confidence) => MatchCategory::from(confidence),
    })
}

/// Category plus the ranking scores, `None` when no locus is scored
pub fn aggregate(
    scores: &LociInfo<Option<LocusScoreDetails>>,
    loci_to_score: &BTreeSet<Locus>,
    loci_excluded: &BTreeSet<Locus>,
) -> Option<ScoreAggregate> {
    let category = aggregate_category(scores, loci_to_score, loci_excluded)?;

    let (grade_score, confidence_score) = contributing(scores, loci_to_score, loci_excluded)
        .flat_map(|locus| [locus.position_1, locus.position_2])
        .fold((0, 0), |(grade, confidence), score| {
            (
                grade + score.grade.weight(),
                confidence + score.confidence.weight(),
            )
        });

    let typed_loci_count = loci_to_score
        .iter()
        .filter(|locus| !loci_excluded.contains(*locus))
        .filter(|&&locus| scores.get(locus).as_ref().is_some_and(|d| d.is_locus_typed))
        .count();

    Some(ScoreAggregate {
        category,
        grade_score,
        confidence_score,
        typed_loci_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MatchGrade;

    fn scored(grade: MatchGrade, confidence: MatchConfidence) -> Option<LocusScoreDetails> {
        Some(LocusScoreDetails {
            is_locus_typed: true,
            scores: Some(LocusInfo::homozygous(PositionScore::new(grade, confidence))),
        })
    }

    fn untyped() -> Option<LocusScoreDetails> {
        Some(LocusScoreDetails {
            is_locus_typed: false,
            scores: None,
        })
    }

    fn loci(list: &[Locus]) -> BTreeSet<Locus> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_lowest_confidence_wins() {
        let mut scores = LociInfo::default();
        scores.a = scored(MatchGrade::GDna, MatchConfidence::Definite);
        scores.b = scored(MatchGrade::GGroup, MatchConfidence::Potential);
        scores.drb1 = scored(MatchGrade::CDna, MatchConfidence::Exact);

        let all = loci(&[Locus::A, Locus::B, Locus::Drb1]);
        assert_eq!(
            aggregate_category(&scores, &all, &BTreeSet::new()),
            Some(MatchCategory::Potential)
        );
        assert_eq!(
            aggregate_category(&scores, &all, &loci(&[Locus::B])),
            Some(MatchCategory::Exact)
        );
    }

    #[test]
    fn test_any_mismatch_confidence_is_mismatch() {
        let mut scores = LociInfo::default();
        scores.a = scored(MatchGrade::GDna, MatchConfidence::Definite);
        scores.dpb1 = scored(MatchGrade::PermissiveMismatch, MatchConfidence::Mismatch);

        let to_score = loci(&[Locus::A, Locus::Dpb1]);
        assert_eq!(
            aggregate_category(&scores, &to_score, &BTreeSet::new()),
            Some(MatchCategory::Mismatch)
        );
        // Excluding DPB1 keeps its mismatch out of the summary
        assert_eq!(
            aggregate_category(&scores, &to_score, &loci(&[Locus::Dpb1])),
            Some(MatchCategory::Definite)
        );
    }

    #[test]
    fn test_null_mismatch_is_mismatch() {
        let mut scores = LociInfo::default();
        scores.a = scored(MatchGrade::NullMismatch, MatchConfidence::Mismatch);
        scores.b = scored(MatchGrade::GDna, MatchConfidence::Definite);
        let to_score = loci(&[Locus::A, Locus::B]);
        assert_eq!(
            aggregate_category(&scores, &to_score, &BTreeSet::new()),
            Some(MatchCategory::Mismatch)
        );

        // The grade alone forces a mismatch
        scores.a = scored(MatchGrade::NullMismatch, MatchConfidence::Definite);
        assert_eq!(
            aggregate_category(&scores, &to_score, &BTreeSet::new()),
            Some(MatchCategory::Mismatch)
        );
    }

    #[test]
    fn test_empty_and_untyped() {
        let mut scores = LociInfo::default();
        scores.c = untyped();

        assert_eq!(
            aggregate_category(&scores, &BTreeSet::new(), &BTreeSet::new()),
            None
        );
        assert_eq!(
            aggregate_category(&scores, &loci(&[Locus::C]), &BTreeSet::new()),
            Some(MatchCategory::Potential)
        );
    }

    #[test]
    fn test_aggregate_scores() {
        let mut scores = LociInfo::default();
        scores.a = scored(MatchGrade::GDna, MatchConfidence::Definite);
        scores.b = scored(MatchGrade::PGroup, MatchConfidence::Exact);
        scores.c = untyped();

        let aggregate = aggregate(&scores, &loci(&[Locus::A, Locus::B, Locus::C]), &BTreeSet::new())
            .unwrap();
        assert_eq!(aggregate.category, MatchCategory::Exact);
        assert_eq!(
            aggregate.grade_score,
            2 * MatchGrade::GDna.weight() + 2 * MatchGrade::PGroup.weight()
        );
        assert_eq!(
            aggregate.confidence_score,
            2 * MatchConfidence::Definite.weight() + 2 * MatchConfidence::Exact.weight()
        );
        assert_eq!(aggregate.typed_loci_count, 2);
    }
}
