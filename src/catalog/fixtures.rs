//! Shared test dictionary.

use std::sync::Arc;

use crate::catalog::resolver::HlaMetadataResolver;
use crate::catalog::store::HlaMetadataDictionary;

pub const DICTIONARY_JSON: &str = include_str!("../../tests/data/dictionary.json");

/// Release holding the full fixture allele set
pub const FIXTURE_VERSION: &str = "3.33.0";

pub fn dictionary() -> HlaMetadataDictionary {
    HlaMetadataDictionary::from_json(DICTIONARY_JSON).expect("fixture dictionary parses")
}

pub fn resolver() -> Arc<dyn HlaMetadataResolver> {
    Arc::new(dictionary())
}
