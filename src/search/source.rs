//! Donor sources feeding a search.

use thiserror::Error;

use crate::core::donor::DonorRecord;
use crate::matching::criteria::DonorFilter;
use crate::parsing::ParseError;

#[derive(Error, Debug)]
pub enum DonorSourceError {
    #[error("Donor source unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Where candidate donors come from.
///
/// The filter lets a source narrow its scan; the search applies it to every
/// donor again, so a source may return more than the filter admits.
pub trait DonorSource: Send + Sync {
    /// Stream candidate donors
    ///
    /// # Errors
    ///
    /// Returns `DonorSourceError` if the source cannot be read.
    fn candidates(
        &self,
        filter: &DonorFilter,
    ) -> Result<Box<dyn Iterator<Item = DonorRecord> + Send + '_>, DonorSourceError>;
}

/// In-memory donor source
#[derive(Debug, Clone, Default)]
pub struct DonorPool {
    donors: Vec<DonorRecord>,
}

impl DonorPool {
    pub fn new(donors: Vec<DonorRecord>) -> Self {
        Self { donors }
    }

    pub fn add(&mut self, donor: DonorRecord) {
        self.donors.push(donor);
    }

    pub fn donors(&self) -> &[DonorRecord] {
        &self.donors
    }

    pub fn len(&self) -> usize {
        self.donors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.donors.is_empty()
    }
}

impl FromIterator<DonorRecord> for DonorPool {
    fn from_iter<I: IntoIterator<Item = DonorRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl DonorSource for DonorPool {
    fn candidates(
        &self,
        filter: &DonorFilter,
    ) -> Result<Box<dyn Iterator<Item = DonorRecord> + Send + '_>, DonorSourceError> {
        // Donor type is the only pushdown; availability and cutoff are left to the search
        let donor_type = filter.donor_type;
        Ok(Box::new(
            self.donors
                .iter()
                .filter(move |d| d.donor_type == donor_type)
                .cloned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phenotype::RawPhenotype;
    use crate::core::types::DonorType;
    use chrono::Utc;

    #[test]
    fn test_pool_narrows_by_donor_type() {
        let now = Utc::now();
        let pool: DonorPool = [
            DonorRecord::new("A1", DonorType::Adult, now, RawPhenotype::untyped()),
            DonorRecord::new("C1", DonorType::Cord, now, RawPhenotype::untyped()),
            DonorRecord::new("A2", DonorType::Adult, now, RawPhenotype::untyped()).unavailable(),
        ]
        .into_iter()
        .collect();
        assert_eq!(pool.len(), 3);

        let filter = DonorFilter::new(DonorType::Adult, None);
        let ids: Vec<String> = pool
            .candidates(&filter)
            .unwrap()
            .map(|d| d.id.0)
            .collect();
        // Availability is checked by the search, not the pool
        assert_eq!(ids, vec!["A1", "A2"]);
    }
}
