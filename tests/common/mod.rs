//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use hla_match::{CachingResolver, HlaMetadataDictionary, PhenotypeExpander};

/// Nomenclature version the fixture dictionary is mostly populated for
pub const VERSION: &str = "3.33.0";

pub fn dictionary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("dictionary.json")
}

pub fn dictionary() -> HlaMetadataDictionary {
    HlaMetadataDictionary::load_from_file(&dictionary_path()).expect("fixture dictionary loads")
}

pub fn expander() -> PhenotypeExpander {
    PhenotypeExpander::new(Arc::new(CachingResolver::new(dictionary())), VERSION)
}
