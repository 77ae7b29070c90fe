//! Expansion of raw phenotypes into matching phenotypes.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::resolver::{HlaMetadataResolver, ResolutionError};
use crate::core::donor::{DonorCandidate, DonorRecord};
use crate::core::metadata::MatchingMetadata;
use crate::core::phenotype::{LocusInfo, PhenotypeInfo, RawPhenotype};
use crate::core::types::{Locus, LocusPosition};

/// Per-position matching metadata. After expansion each locus is either typed
/// at both positions or at neither.
pub type ExpandedPhenotype = PhenotypeInfo<Option<Arc<MatchingMetadata>>>;

/// Expanded typing at one locus
pub type ExpandedLocus = LocusInfo<Option<Arc<MatchingMetadata>>>;

/// Both positions of a typed locus, or `None` when the locus is untyped
pub fn typed_positions(locus: &ExpandedLocus) -> Option<LocusInfo<&MatchingMetadata>> {
    match (&locus.position_1, &locus.position_2) {
        (Some(p1), Some(p2)) => Some(LocusInfo::new(&**p1, &**p2)),
        _ => None,
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot expand {locus} position {position}: {source}")]
pub struct ExpansionError {
    pub locus: Locus,
    pub position: LocusPosition,
    #[source]
    pub source: ResolutionError,
}

/// Resolves raw phenotypes against one pinned nomenclature version
#[derive(Clone)]
pub struct PhenotypeExpander {
    resolver: Arc<dyn HlaMetadataResolver>,
    nomenclature_version: String,
}

impl PhenotypeExpander {
    pub fn new(resolver: Arc<dyn HlaMetadataResolver>, nomenclature_version: impl Into<String>) -> Self {
        Self {
            resolver,
            nomenclature_version: nomenclature_version.into(),
        }
    }

    pub fn nomenclature_version(&self) -> &str {
        &self.nomenclature_version
    }

    /// Resolve every typed slot of `raw`.
    ///
    /// A locus typed at one position only is homozygous by typing: the typed
    /// metadata fills both positions.
    ///
    /// # Errors
    ///
    /// Returns `ExpansionError` naming the first locus and position whose
    /// typing cannot be resolved.
    pub fn expand(&self, raw: &RawPhenotype) -> Result<ExpandedPhenotype, ExpansionError> {
        raw.try_map(|locus, slots| self.expand_locus(locus, slots))
    }

    /// Expand a donor record into a candidate ready for matching
    ///
    /// # Errors
    ///
    /// Returns `ExpansionError` when any donor typing cannot be resolved.
    pub fn expand_donor(&self, record: &DonorRecord) -> Result<DonorCandidate, ExpansionError> {
        Ok(DonorCandidate {
            id: record.id.clone(),
            donor_type: record.donor_type,
            phenotype: self.expand(&record.hla)?,
        })
    }

    pub fn expand_locus(
        &self,
        locus: Locus,
        slots: &LocusInfo<Option<String>>,
    ) -> Result<ExpandedLocus, ExpansionError> {
        let resolved = slots.map(|position, raw| {
            raw.as_deref()
                .filter(|r| !r.trim().is_empty())
                .map(|r| self.resolve(locus, position, r))
                .transpose()
        });

        let position_1 = resolved.position_1?;
        let position_2 = resolved.position_2?;
        Ok(match (position_1, position_2) {
            (Some(p1), Some(p2)) => LocusInfo::new(Some(p1), Some(p2)),
            (Some(only), None) | (None, Some(only)) => LocusInfo::homozygous(Some(only)),
            (None, None) => LocusInfo::default(),
        })
    }

    fn resolve(
        &self,
        locus: Locus,
        position: LocusPosition,
        raw: &str,
    ) -> Result<Arc<MatchingMetadata>, ExpansionError> {
        self.resolver
            .resolve(locus, raw, &self.nomenclature_version)
            .map_err(|source| ExpansionError {
                locus,
                position,
                source,
            })
    }
}

impl std::fmt::Debug for PhenotypeExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhenotypeExpander")
            .field("nomenclature_version", &self.nomenclature_version)
            .finish_non_exhaustive()
    }
}
