//! Position-level grades and confidences.
//!
//! Each donor position is scored against the patient position it was paired
//! with by the locus match. The grade names the finest level at which the two
//! typings agree; the confidence says how sure that agreement is given the
//! typing resolution on both sides.

use serde::Serialize;

use crate::core::metadata::{HlaAllele, MatchingMetadata};
use crate::core::phenotype::LocusInfo;
use crate::core::types::{Locus, LocusPosition, MatchConfidence, MatchGrade, TypingCategory};
use crate::matching::expansion::{typed_positions, ExpandedLocus};
use crate::matching::locus::{is_homozygous, match_locus, Orientation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionScore {
    pub grade: MatchGrade,
    pub confidence: MatchConfidence,
}

impl PositionScore {
    pub fn new(grade: MatchGrade, confidence: MatchConfidence) -> Self {
        Self { grade, confidence }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocusScoreDetails {
    /// Whether the donor is typed at this locus
    pub is_locus_typed: bool,
    /// Scores indexed by donor position; absent when either side is untyped
    pub scores: Option<LocusInfo<PositionScore>>,
}

/// Score both donor positions at one locus.
///
/// Positions are paired by the orientation that wins locus matching. When
/// both orientations reach the same match count, the pairing with the better
/// summed grade wins, then the better summed confidence, then direct pairing.
pub fn score_locus(locus: Locus, patient: &ExpandedLocus, donor: &ExpandedLocus) -> LocusScoreDetails {
    let is_locus_typed = donor.is_typed();
    let (Some(patient_typing), Some(donor_typing)) = (typed_positions(patient), typed_positions(donor)) else {
        return LocusScoreDetails {
            is_locus_typed,
            scores: None,
        };
    };

    let details = match_locus(patient, donor);
    let context = LocusContext {
        locus,
        patient: patient_typing,
        donor: donor_typing,
        patient_homozygous: is_homozygous(&patient_typing),
        full_match: details.match_count == 2,
    };

    let mut best: Option<LocusInfo<PositionScore>> = None;
    for &orientation in details.orientations.candidates() {
        let scores = LocusInfo::new(
            context.score_position(orientation, LocusPosition::One),
            context.score_position(orientation, LocusPosition::Two),
        );
        // Strictly better only, so direct pairing keeps ties
        if best.map_or(true, |current| ranking(&scores) > ranking(&current)) {
            best = Some(scores);
        }
    }

    LocusScoreDetails {
        is_locus_typed,
        scores: best,
    }
}

fn ranking(scores: &LocusInfo<PositionScore>) -> (u32, u32) {
    scores.iter().fold((0, 0), |(grade, confidence), (_, score)| {
        (
            grade + score.grade.weight(),
            confidence + score.confidence.weight(),
        )
    })
}

struct LocusContext<'a> {
    locus: Locus,
    patient: LocusInfo<&'a MatchingMetadata>,
    donor: LocusInfo<&'a MatchingMetadata>,
    patient_homozygous: bool,
    full_match: bool,
}

impl LocusContext<'_> {
    fn score_position(&self, orientation: Orientation, donor_position: LocusPosition) -> PositionScore {
        let patient_position = orientation.patient_position(donor_position);
        let p = *self.patient.get(patient_position);
        let d = *self.donor.get(donor_position);

        match (p.is_null(), d.is_null()) {
            (true, true) => score_null_pair(p, d),
            (true, false) => {
                let partner = *self.patient.get(patient_position.other());
                self.score_expressing_vs_null(partner, d)
            }
            (false, true) => {
                let partner = *self.donor.get(donor_position.other());
                self.score_expressing_vs_null(partner, p)
            }
            (false, false) => score_expressing_pair(self.locus, p, d),
        }
    }

    /// `partner` is the expressing position sharing a locus with the null side
    fn score_expressing_vs_null(
        &self,
        partner: &MatchingMetadata,
        expressing: &MatchingMetadata,
    ) -> PositionScore {
        let confidence = if self.patient_homozygous
            && self.full_match
            && !partner.is_null()
            && partner.shares_g_group(expressing)
        {
            shared_confidence(partner, expressing)
        } else {
            MatchConfidence::Mismatch
        };
        PositionScore::new(MatchGrade::ExpressingVsNull, confidence)
    }
}

fn score_null_pair(p: &MatchingMetadata, d: &MatchingMetadata) -> PositionScore {
    let grade = best_over_pairs(p.alleles.iter(), d.alleles.iter(), |a, b| {
        if a.g_group != b.g_group {
            MatchGrade::NullMismatch
        } else if a.name == b.name && a.is_full_gdna() && b.is_full_gdna() {
            MatchGrade::NullGDna
        } else if a.is_full_sequence() && b.is_full_sequence() && a.parsed.shares_fields(&b.parsed, 3) {
            MatchGrade::NullCDna
        } else {
            MatchGrade::NullPartial
        }
    })
    .unwrap_or(MatchGrade::NullMismatch);
    let confidence = if grade.is_mismatch() {
        MatchConfidence::Mismatch
    } else {
        MatchConfidence::Definite
    };
    PositionScore::new(grade, confidence)
}

fn score_expressing_pair(locus: Locus, p: &MatchingMetadata, d: &MatchingMetadata) -> PositionScore {
    let grade = expressing_grade(p, d);
    if grade != MatchGrade::Mismatch {
        return PositionScore::new(grade, shared_confidence(p, d));
    }

    if locus == Locus::Dpb1 && p.shares_single_tce_group(d) {
        return PositionScore::new(MatchGrade::PermissiveMismatch, MatchConfidence::Mismatch);
    }
    PositionScore::new(MatchGrade::Mismatch, MatchConfidence::Mismatch)
}

/// Finest shared level between two expressing typings
fn expressing_grade(p: &MatchingMetadata, d: &MatchingMetadata) -> MatchGrade {
    let is_serology = |m: &MatchingMetadata| m.typing_category == TypingCategory::Serology;
    let shares_p = p.shares_p_group(d);

    if is_serology(p) || is_serology(d) {
        return if shares_p {
            MatchGrade::PGroup
        } else {
            MatchGrade::Mismatch
        };
    }

    if p.typing_category.is_allele_level() && d.typing_category.is_allele_level() {
        return best_over_pairs(expressing(p), expressing(d), allele_grade)
            .unwrap_or(MatchGrade::Mismatch);
    }

    let shares_g = expressing(p).any(|a| expressing(d).any(|b| a.g_group == b.g_group));
    if shares_g {
        MatchGrade::GGroup
    } else if shares_p {
        MatchGrade::PGroup
    } else {
        MatchGrade::Mismatch
    }
}

fn allele_grade(a: &HlaAllele, b: &HlaAllele) -> MatchGrade {
    if a.name == b.name && a.is_full_gdna() && b.is_full_gdna() {
        MatchGrade::GDna
    } else if a.is_full_sequence() && b.is_full_sequence() && a.parsed.shares_fields(&b.parsed, 3) {
        MatchGrade::CDna
    } else if a.parsed.shares_fields(&b.parsed, 2) {
        MatchGrade::Protein
    } else if a.g_group == b.g_group {
        MatchGrade::GGroup
    } else if a.matching_p_group().is_some() && a.matching_p_group() == b.matching_p_group() {
        MatchGrade::PGroup
    } else {
        MatchGrade::Mismatch
    }
}

/// Confidence of an agreement between two expressing typings
fn shared_confidence(p: &MatchingMetadata, d: &MatchingMetadata) -> MatchConfidence {
    let capped = |m: &MatchingMetadata| {
        matches!(
            m.typing_category,
            TypingCategory::Serology | TypingCategory::XxCode
        )
    };

    if p.is_unambiguous_allele() && d.is_unambiguous_allele() {
        MatchConfidence::Definite
    } else if !capped(p) && !capped(d) && p.single_p_group().is_some() && p.single_p_group() == d.single_p_group() {
        MatchConfidence::Exact
    } else {
        MatchConfidence::Potential
    }
}

fn expressing(m: &MatchingMetadata) -> impl Iterator<Item = &HlaAllele> + Clone {
    m.alleles.iter().filter(|a| !a.is_null())
}

fn best_over_pairs<'a, I, J>(left: I, right: J, grade: impl Fn(&HlaAllele, &HlaAllele) -> MatchGrade) -> Option<MatchGrade>
where
    I: Iterator<Item = &'a HlaAllele>,
    J: Iterator<Item = &'a HlaAllele> + Clone,
{
    left.flat_map(|a| right.clone().map(move |b| (a, b)))
        .map(|(a, b)| grade(a, b))
        .max()
}
