//! Per-locus and per-position containers.

use serde::{Deserialize, Serialize};

use crate::core::types::{Locus, LocusPosition};

/// The two position slots at a single locus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LocusInfo<T> {
    pub position_1: T,
    pub position_2: T,
}

impl<T> LocusInfo<T> {
    pub fn new(position_1: T, position_2: T) -> Self {
        Self {
            position_1,
            position_2,
        }
    }

    pub fn get(&self, position: LocusPosition) -> &T {
        match position {
            LocusPosition::One => &self.position_1,
            LocusPosition::Two => &self.position_2,
        }
    }

    pub fn as_ref(&self) -> LocusInfo<&T> {
        LocusInfo::new(&self.position_1, &self.position_2)
    }

    pub fn map<U>(&self, mut f: impl FnMut(LocusPosition, &T) -> U) -> LocusInfo<U> {
        LocusInfo::new(
            f(LocusPosition::One, &self.position_1),
            f(LocusPosition::Two, &self.position_2),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocusPosition, &T)> {
        [
            (LocusPosition::One, &self.position_1),
            (LocusPosition::Two, &self.position_2),
        ]
        .into_iter()
    }
}

impl<T: Clone> LocusInfo<T> {
    /// Same value at both positions
    pub fn homozygous(value: T) -> Self {
        Self::new(value.clone(), value)
    }
}

impl<T> LocusInfo<Option<T>> {
    /// Both slots, when both are present
    pub fn both(&self) -> Option<LocusInfo<&T>> {
        match (&self.position_1, &self.position_2) {
            (Some(p1), Some(p2)) => Some(LocusInfo::new(p1, p2)),
            _ => None,
        }
    }

    pub fn is_typed(&self) -> bool {
        self.position_1.is_some() || self.position_2.is_some()
    }
}

/// One value per HLA locus.
///
/// Fields are reached through an exhaustive match on [`Locus`], so adding a
/// locus is a compile error everywhere it matters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct LociInfo<T> {
    pub a: T,
    pub b: T,
    pub c: T,
    pub dpb1: T,
    pub dqb1: T,
    pub drb1: T,
}

impl<T> LociInfo<T> {
    /// Build by evaluating `f` for every locus
    pub fn from_fn(mut f: impl FnMut(Locus) -> T) -> Self {
        Self {
            a: f(Locus::A),
            b: f(Locus::B),
            c: f(Locus::C),
            dpb1: f(Locus::Dpb1),
            dqb1: f(Locus::Dqb1),
            drb1: f(Locus::Drb1),
        }
    }

    pub fn get(&self, locus: Locus) -> &T {
        match locus {
            Locus::A => &self.a,
            Locus::B => &self.b,
            Locus::C => &self.c,
            Locus::Dpb1 => &self.dpb1,
            Locus::Dqb1 => &self.dqb1,
            Locus::Drb1 => &self.drb1,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Locus, &T) -> U) -> LociInfo<U> {
        LociInfo::from_fn(|locus| f(locus, self.get(locus)))
    }

    /// Fallible map, stopping at the first error in locus order
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(Locus, &T) -> Result<U, E>,
    ) -> Result<LociInfo<U>, E> {
        Ok(LociInfo {
            a: f(Locus::A, &self.a)?,
            b: f(Locus::B, &self.b)?,
            c: f(Locus::C, &self.c)?,
            dpb1: f(Locus::Dpb1, &self.dpb1)?,
            dqb1: f(Locus::Dqb1, &self.dqb1)?,
            drb1: f(Locus::Drb1, &self.drb1)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Locus, &T)> {
        Locus::ALL.into_iter().map(move |locus| (locus, self.get(locus)))
    }
}

/// Typing values for every locus and position
pub type PhenotypeInfo<T> = LociInfo<LocusInfo<T>>;

/// A phenotype of raw typing strings, `None` where a slot is untyped
pub type RawPhenotype = PhenotypeInfo<Option<String>>;

impl RawPhenotype {
    /// Start from an entirely untyped phenotype
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Return a copy with both positions at `locus` set
    #[must_use]
    pub fn with_locus(
        mut self,
        locus: Locus,
        position_1: impl Into<String>,
        position_2: impl Into<String>,
    ) -> Self {
        let slot = LocusInfo::new(Some(position_1.into()), Some(position_2.into()));
        match locus {
            Locus::A => self.a = slot,
            Locus::B => self.b = slot,
            Locus::C => self.c = slot,
            Locus::Dpb1 => self.dpb1 = slot,
            Locus::Dqb1 => self.dqb1 = slot,
            Locus::Drb1 => self.drb1 = slot,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loci_info_get_matches_fields() {
        let info = LociInfo::from_fn(|locus| locus.to_string());
        assert_eq!(info.a, "A");
        assert_eq!(info.get(Locus::Dpb1), "DPB1");
        assert_eq!(info.get(Locus::Drb1), "DRB1");
        assert_eq!(info.iter().count(), 6);
    }

    #[test]
    fn test_try_map_stops_on_error() {
        let info = LociInfo::from_fn(|locus| locus);
        let result: Result<LociInfo<Locus>, Locus> = info.try_map(|locus, _| {
            if locus == Locus::C {
                Err(locus)
            } else {
                Ok(locus)
            }
        });
        assert_eq!(result.unwrap_err(), Locus::C);
    }

    #[test]
    fn test_locus_info_both() {
        let typed = LocusInfo::new(Some(1), Some(2));
        assert_eq!(typed.both(), Some(LocusInfo::new(&1, &2)));

        let half: LocusInfo<Option<i32>> = LocusInfo::new(Some(1), None);
        assert!(half.both().is_none());
        assert!(half.is_typed());

        let untyped: LocusInfo<Option<i32>> = LocusInfo::default();
        assert!(!untyped.is_typed());
    }

    #[test]
    fn test_raw_phenotype_builder() {
        let phenotype = RawPhenotype::untyped().with_locus(Locus::B, "07:02", "08:01");
        assert_eq!(phenotype.b.position_1.as_deref(), Some("07:02"));
        assert_eq!(phenotype.b.position_2.as_deref(), Some("08:01"));
        assert!(!phenotype.a.is_typed());
    }
}
