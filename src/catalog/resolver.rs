//! Resolution of raw typings into matching metadata.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::store::{HlaMetadataDictionary, LocusIndex, NomenclatureRelease};
use crate::core::metadata::{HlaAllele, MatchingMetadata};
use crate::core::types::Locus;
use crate::core::typing::{expand_subtypes, parse_typing, ParsedTyping};
use crate::utils::validation::{is_valid_typing_length, normalize_typing};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Unknown nomenclature version '{0}'")]
    UnknownVersion(String),

    #[error("Malformed {locus} typing '{typing}': {reason}")]
    Malformed {
        locus: Locus,
        typing: String,
        reason: String,
    },

    #[error("Unknown {locus} allele '{typing}'")]
    UnknownAllele { locus: Locus, typing: String },

    #[error("Unknown {locus} NMDP code '{typing}'")]
    UnknownNmdpCode { locus: Locus, typing: String },

    #[error("Unknown {locus} serology '{typing}'")]
    UnknownSerology { locus: Locus, typing: String },
}

/// Lookup contract of the HLA nomenclature dictionary.
///
/// Implementations must be deterministic: the same `(locus, raw, version)`
/// always resolves to equal metadata.
pub trait HlaMetadataResolver: Send + Sync {
    /// Resolve one raw typing at `locus` under a pinned nomenclature version
    ///
    /// # Errors
    ///
    /// Returns a `ResolutionError` when the version is unknown or the typing
    /// cannot be mapped to any allele.
    fn resolve(
        &self,
        locus: Locus,
        raw: &str,
        nomenclature_version: &str,
    ) -> Result<Arc<MatchingMetadata>, ResolutionError>;
}

impl HlaMetadataResolver for HlaMetadataDictionary {
    fn resolve(
        &self,
        locus: Locus,
        raw: &str,
        nomenclature_version: &str,
    ) -> Result<Arc<MatchingMetadata>, ResolutionError> {
        let release = self
            .release(nomenclature_version)
            .ok_or_else(|| ResolutionError::UnknownVersion(nomenclature_version.to_string()))?;

        let malformed = |reason: String| ResolutionError::Malformed {
            locus,
            typing: raw.trim().to_string(),
            reason,
        };
        if !is_valid_typing_length(raw) {
            return Err(malformed("typing too long".to_string()));
        }
        let lookup_name = normalize_typing(raw).ok_or_else(|| malformed("empty".to_string()))?;
        let parsed = parse_typing(raw).map_err(|e| malformed(e.to_string()))?;

        let alleles = resolve_alleles(release, locus, &lookup_name, &parsed)?;
        Ok(Arc::new(MatchingMetadata::from_alleles(
            locus,
            lookup_name,
            parsed.category(),
            alleles,
        )))
    }
}

fn resolve_alleles(
    release: &NomenclatureRelease,
    locus: Locus,
    lookup_name: &str,
    parsed: &ParsedTyping,
) -> Result<Vec<HlaAllele>, ResolutionError> {
    let index = release.locus(locus);
    let typing = lookup_name.to_string();

    match parsed {
        ParsedTyping::Allele(name) => {
            let alleles = owned(index.find_alleles(name));
            if alleles.is_empty() {
                Err(ResolutionError::UnknownAllele { locus, typing })
            } else {
                Ok(alleles)
            }
        }
        ParsedTyping::AlleleString(members) => {
            let mut alleles = Vec::new();
            for member in members {
                let found = index.find_alleles(member);
                if found.is_empty() {
                    return Err(ResolutionError::UnknownAllele {
                        locus,
                        typing: member.clone(),
                    });
                }
                alleles.extend(found.into_iter().cloned());
            }
            Ok(alleles)
        }
        ParsedTyping::NmdpCode { first_field, code } => {
            let list = release
                .nmdp_code(code)
                .ok_or_else(|| ResolutionError::UnknownNmdpCode {
                    locus,
                    typing: typing.clone(),
                })?;
            // Codes are shared across loci, so not every member exists at this one
            let alleles: Vec<HlaAllele> = expand_subtypes(first_field, list)
                .iter()
                .flat_map(|member| owned(index.find_alleles(member)))
                .collect();
            if alleles.is_empty() {
                Err(ResolutionError::UnknownNmdpCode { locus, typing })
            } else {
                Ok(alleles)
            }
        }
        ParsedTyping::XxCode { first_field } => {
            let alleles: Vec<HlaAllele> = index
                .family(first_field)
                .filter(|a| !a.is_null())
                .cloned()
                .collect();
            if alleles.is_empty() {
                Err(ResolutionError::UnknownAllele { locus, typing })
            } else {
                Ok(alleles)
            }
        }
        ParsedTyping::Serology(name) => resolve_serology(index, locus, name),
    }
}

fn resolve_serology(
    index: &LocusIndex,
    locus: Locus,
    name: &str,
) -> Result<Vec<HlaAllele>, ResolutionError> {
    let unknown = || ResolutionError::UnknownSerology {
        locus,
        typing: name.to_string(),
    };
    let members = index.serology(name).ok_or_else(unknown)?;
    let alleles: Vec<HlaAllele> = members
        .iter()
        .flat_map(|member| owned(index.find_alleles(member)))
        .collect();
    if alleles.is_empty() {
        Err(unknown())
    } else {
        Ok(alleles)
    }
}

fn owned(alleles: Vec<&HlaAllele>) -> Vec<HlaAllele> {
    alleles.into_iter().cloned().collect()
}
