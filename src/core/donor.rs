use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::phenotype::RawPhenotype;
use crate::core::types::DonorType;
use crate::matching::expansion::ExpandedPhenotype;

/// Registry identifier of a donor
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DonorId(pub String);

impl DonorId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for DonorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A donor as delivered by a donor source, typings still raw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorRecord {
    pub id: DonorId,

    pub donor_type: DonorType,

    /// When the record was last changed at the registry
    pub last_updated: DateTime<Utc>,

    #[serde(default = "default_available")]
    pub is_available_for_search: bool,

    pub hla: RawPhenotype,
}

fn default_available() -> bool {
    true
}

impl DonorRecord {
    pub fn new(
        id: impl Into<String>,
        donor_type: DonorType,
        last_updated: DateTime<Utc>,
        hla: RawPhenotype,
    ) -> Self {
        Self {
            id: DonorId::new(id),
            donor_type,
            last_updated,
            is_available_for_search: true,
            hla,
        }
    }

    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.is_available_for_search = false;
        self
    }
}

/// A donor with its matching phenotype resolved, ready for matching
#[derive(Debug, Clone)]
pub struct DonorCandidate {
    pub id: DonorId,
    pub donor_type: DonorType,
    pub phenotype: ExpandedPhenotype,
}
