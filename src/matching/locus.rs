//! Per-locus match counting.
//!
//! A position's matching identity is its set of P-groups. Null positions
//! carry no P-group, so a null position whose partner expresses takes over the
//! partner's P-groups (homozygous by expression), and two nulls with nothing to
//! take over are compared by G-group instead.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::metadata::MatchingMetadata;
use crate::core::phenotype::LocusInfo;
use crate::core::types::LocusPosition;
use crate::matching::expansion::{typed_positions, ExpandedLocus};

/// Pairing of patient positions with donor positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// (patient 1, donor 1) and (patient 2, donor 2)
    Direct,
    /// (patient 1, donor 2) and (patient 2, donor 1)
    Cross,
}

impl Orientation {
    /// Patient position compared against `donor_position`
    pub fn patient_position(self, donor_position: LocusPosition) -> LocusPosition {
        match self {
            Self::Direct => donor_position,
            Self::Cross => donor_position.other(),
        }
    }

    /// Patient/donor position pairs, indexed by donor position
    pub fn pair<T: Copy>(self, patient: LocusInfo<T>, donor: LocusInfo<T>) -> LocusInfo<(T, T)> {
        match self {
            Self::Direct => LocusInfo::new(
                (patient.position_1, donor.position_1),
                (patient.position_2, donor.position_2),
            ),
            Self::Cross => LocusInfo::new(
                (patient.position_2, donor.position_1),
                (patient.position_1, donor.position_2),
            ),
        }
    }
}

/// Orientations that reach the locus match count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrientations {
    Direct,
    Cross,
    Both,
}

impl MatchOrientations {
    pub fn candidates(self) -> &'static [Orientation] {
        match self {
            Self::Direct => &[Orientation::Direct],
            Self::Cross => &[Orientation::Cross],
            Self::Both => &[Orientation::Direct, Orientation::Cross],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocusMatchDetails {
    /// 0, 1 or 2; an untyped locus counts as 2
    pub match_count: u8,
    pub orientations: MatchOrientations,
    /// Whether the donor is typed at this locus
    pub is_locus_typed: bool,
}

impl LocusMatchDetails {
    pub fn mismatch_count(&self) -> u8 {
        2 - self.match_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Identity<'a> {
    PGroups(&'a BTreeSet<String>),
    NullGGroups(&'a BTreeSet<String>),
}

impl Identity<'_> {
    fn matches(self, other: Identity<'_>) -> bool {
        match (self, other) {
            (Self::PGroups(a), Identity::PGroups(b))
            | (Self::NullGGroups(a), Identity::NullGGroups(b)) => !a.is_disjoint(b),
            _ => false,
        }
    }
}

fn identities<'a>(locus: &LocusInfo<&'a MatchingMetadata>) -> LocusInfo<Identity<'a>> {
    let (p1, p2) = (locus.position_1, locus.position_2);
    let own = |m: &'a MatchingMetadata, partner: &'a MatchingMetadata| {
        if !m.is_null() {
            Identity::PGroups(&m.p_groups)
        } else if !partner.is_null() {
            Identity::PGroups(&partner.p_groups)
        } else {
            Identity::NullGGroups(&m.g_groups)
        }
    };
    LocusInfo::new(own(p1, p2), own(p2, p1))
}

/// Homozygous by typing (both expressing, same single P-group) or by expression
/// (exactly one null position)
pub fn is_homozygous(locus: &LocusInfo<&MatchingMetadata>) -> bool {
    let (p1, p2) = (locus.position_1, locus.position_2);
    match (p1.is_null(), p2.is_null()) {
        (false, false) => p1.single_p_group().is_some() && p1.single_p_group() == p2.single_p_group(),
        (true, false) | (false, true) => true,
        (true, true) => false,
    }
}

/// Count matches at one locus, taking the better of direct and crossed pairing
pub fn match_locus(patient: &ExpandedLocus, donor: &ExpandedLocus) -> LocusMatchDetails {
    let is_locus_typed = donor.is_typed();
    let (Some(patient), Some(donor)) = (typed_positions(patient), typed_positions(donor)) else {
        return LocusMatchDetails {
            match_count: 2,
            orientations: MatchOrientations::Both,
            is_locus_typed,
        };
    };

    let (patient_ids, donor_ids) = (identities(&patient), identities(&donor));
    let count = |orientation: Orientation| -> u8 {
        let pairs = orientation.pair(patient_ids, donor_ids);
        [pairs.position_1, pairs.position_2]
            .into_iter()
            .filter(|(p, d)| p.matches(*d))
            .count() as u8
    };

    let direct = count(Orientation::Direct);
    let cross = count(Orientation::Cross);
    let orientations = match direct.cmp(&cross) {
        std::cmp::Ordering::Greater => MatchOrientations::Direct,
        std::cmp::Ordering::Less => MatchOrientations::Cross,
        std::cmp::Ordering::Equal => MatchOrientations::Both,
    };

    let mut match_count = direct.max(cross);
    if match_count > 0 && is_homozygous(&patient) {
        match_count = 2;
    }

    LocusMatchDetails {
        match_count,
        orientations,
        is_locus_typed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{resolver, FIXTURE_VERSION};
    use crate::core::types::Locus;
    use crate::matching::expansion::PhenotypeExpander;

    fn typed(locus: Locus, p1: &str, p2: &str) -> ExpandedLocus {
        PhenotypeExpander::new(resolver(), FIXTURE_VERSION)
            .expand_locus(locus, &LocusInfo::new(Some(p1.to_string()), Some(p2.to_string())))
            .unwrap()
    }

    #[test]
    fn test_untyped_either_side_counts_two() {
        let typed_locus = typed(Locus::C, "07:01", "07:02");
        let untyped = ExpandedLocus::default();

        let details = match_locus(&untyped, &typed_locus);
        assert_eq!(details.match_count, 2);
        assert!(details.is_locus_typed);

        let details = match_locus(&typed_locus, &untyped);
        assert_eq!(details.match_count, 2);
        assert!(!details.is_locus_typed);
    }

    #[test]
    fn test_full_match_direct_and_crossed() {
        let patient = typed(Locus::B, "07:02", "08:01");

        let direct = match_locus(&patient, &typed(Locus::B, "07:02:01:01", "08:01:01:01"));
        assert_eq!(direct.match_count, 2);
        assert_eq!(direct.orientations, MatchOrientations::Direct);

        let crossed = match_locus(&patient, &typed(Locus::B, "08:01", "07:02"));
        assert_eq!(crossed.match_count, 2);
        assert_eq!(crossed.orientations, MatchOrientations::Cross);
    }

    #[test]
    fn test_single_mismatch() {
        let patient = typed(Locus::B, "07:02", "08:01");
        let details = match_locus(&patient, &typed(Locus::B, "07:02", "44:02"));
        assert_eq!(details.match_count, 1);
        assert_eq!(details.mismatch_count(), 1);
        assert_eq!(details.orientations, MatchOrientations::Direct);
    }

    #[test]
    fn test_no_shared_groups_is_double_mismatch() {
        let patient = typed(Locus::A, "01:01", "02:01:01:01");
        let details = match_locus(&patient, &typed(Locus::A, "03:01:01:01", "24:02"));
        assert_eq!(details.match_count, 0);
        assert_eq!(details.orientations, MatchOrientations::Both);
    }

    #[test]
    fn test_homozygous_patient_counts_two_on_any_match() {
        let patient = typed(Locus::A, "01:01:01:01", "01:01:01:01");
        let details = match_locus(&patient, &typed(Locus::A, "01:01:01:02", "24:02"));
        assert_eq!(details.match_count, 2);
    }

    #[test]
    fn test_null_takes_over_expressing_partner() {
        // Patient is homozygous by expression
        let patient = typed(Locus::A, "01:01:01:01", "01:04N");
        let donor = typed(Locus::A, "01:01:01:01", "01:01:01:01");
        assert_eq!(match_locus(&patient, &donor).match_count, 2);

        let donor = typed(Locus::A, "03:01:01:01", "24:02");
        assert_eq!(match_locus(&patient, &donor).match_count, 0);
    }

    #[test]
    fn test_double_null_matches_by_g_group() {
        let patient = typed(Locus::A, "03:01:01:02N", "03:01:01:02N");
        let same_group = typed(Locus::A, "03:01:01:03N", "03:01:01:03N");
        assert_eq!(match_locus(&patient, &same_group).match_count, 2);

        let other_group = typed(Locus::A, "01:04N", "02:15N");
        assert_eq!(match_locus(&patient, &other_group).match_count, 0);
    }

    #[test]
    fn test_allele_strings_match_on_any_member() {
        let patient = typed(Locus::A, "02:15N/02:32", "11:01");
        let donor = typed(Locus::A, "02:32:01", "11:01");
        assert_eq!(match_locus(&patient, &donor).match_count, 2);
    }

    #[test]
    fn test_is_homozygous() {
        let homozygous = typed(Locus::A, "01:01:01:01", "01:01:01:02");
        assert!(is_homozygous(&typed_positions(&homozygous).unwrap()));

        let by_expression = typed(Locus::A, "02:15N", "24:02");
        assert!(is_homozygous(&typed_positions(&by_expression).unwrap()));

        let heterozygous = typed(Locus::A, "01:01", "24:02");
        assert!(!is_homozygous(&typed_positions(&heterozygous).unwrap()));

        // Ambiguous P-group assignment is not homozygous by typing
        let ambiguous = typed(Locus::A, "01:AB", "01:AB");
        assert!(!is_homozygous(&typed_positions(&ambiguous).unwrap()));
    }
}
