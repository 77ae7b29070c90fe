use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{ExpressionCategory, Locus, TypingCategory};
use crate::core::typing::AlleleName;

/// Which sequence an allele was characterised from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnaCategory {
    /// Genomic DNA, introns included
    #[default]
    GDna,
    /// Coding DNA only
    CDna,
}

/// Whether the allele's sequence is fully known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStatus {
    #[default]
    Full,
    Partial,
}

/// A single allele from the nomenclature dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HlaAllele {
    pub name: String,
    #[serde(skip)]
    pub parsed: AlleleName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_group: Option<String>,
    pub g_group: String,
    pub dna_category: DnaCategory,
    pub sequence_status: SequenceStatus,
    /// DPB1 T-cell epitope group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tce_group: Option<String>,
}

impl HlaAllele {
    pub fn is_null(&self) -> bool {
        self.parsed.is_null()
    }

    /// P-group used for matching; null alleles have none
    pub fn matching_p_group(&self) -> Option<&str> {
        if self.is_null() {
            None
        } else {
            self.p_group.as_deref()
        }
    }

    pub fn is_full_sequence(&self) -> bool {
        self.sequence_status == SequenceStatus::Full
    }

    pub fn is_full_gdna(&self) -> bool {
        self.is_full_sequence() && self.dna_category == DnaCategory::GDna
    }
}

/// Everything needed to match and score one typing at one locus.
///
/// Built once per distinct raw typing and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchingMetadata {
    pub locus: Locus,
    /// Normalised typing the metadata was resolved from
    pub lookup_name: String,
    pub typing_category: TypingCategory,
    pub expression: ExpressionCategory,
    /// Candidate alleles the typing may represent
    pub alleles: Vec<HlaAllele>,
    pub p_groups: BTreeSet<String>,
    pub g_groups: BTreeSet<String>,
    pub tce_groups: BTreeSet<String>,
}

impl MatchingMetadata {
    /// Collect groups and expression over the candidate alleles.
    ///
    /// Duplicate alleles are dropped, keeping first occurrence order.
    pub fn from_alleles(
        locus: Locus,
        lookup_name: impl Into<String>,
        typing_category: TypingCategory,
        alleles: Vec<HlaAllele>,
    ) -> Self {
        let mut seen = HashSet::new();
        let alleles: Vec<HlaAllele> = alleles
            .into_iter()
            .filter(|a| seen.insert(a.name.clone()))
            .collect();

        let p_groups = alleles
            .iter()
            .filter_map(|a| a.matching_p_group().map(str::to_string))
            .collect();
        let g_groups = alleles.iter().map(|a| a.g_group.clone()).collect();
        let tce_groups = alleles
            .iter()
            .filter(|a| !a.is_null())
            .filter_map(|a| a.tce_group.clone())
            .collect();
        let expression = ExpressionCategory::from_null_flags(alleles.iter().map(HlaAllele::is_null));

        Self {
            locus,
            lookup_name: lookup_name.into(),
            typing_category,
            expression,
            alleles,
            p_groups,
            g_groups,
            tce_groups,
        }
    }

    /// Explicitly null: every candidate allele is null
    pub fn is_null(&self) -> bool {
        self.expression == ExpressionCategory::Null
    }

    /// A single-allele typing that resolved to exactly one allele
    pub fn is_unambiguous_allele(&self) -> bool {
        self.typing_category == TypingCategory::SingleAllele && self.alleles.len() == 1
    }

    pub fn single_p_group(&self) -> Option<&str> {
        if self.p_groups.len() == 1 {
            self.p_groups.iter().next().map(String::as_str)
        } else {
            None
        }
    }

    pub fn shares_p_group(&self, other: &MatchingMetadata) -> bool {
        !self.p_groups.is_disjoint(&other.p_groups)
    }

    pub fn shares_g_group(&self, other: &MatchingMetadata) -> bool {
        !self.g_groups.is_disjoint(&other.g_groups)
    }

    /// Both sides carry exactly one, identical, TCE group
    pub fn shares_single_tce_group(&self, other: &MatchingMetadata) -> bool {
        self.tce_groups.len() == 1 && self.tce_groups == other.tce_groups
    }
}
