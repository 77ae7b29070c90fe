//! HLA nomenclature dictionary lookup.
//!
//! The dictionary maps raw typings to [`MatchingMetadata`] for a pinned
//! nomenclature version. Its contents are produced elsewhere; this crate only
//! loads a versioned JSON snapshot and answers lookups.
//!
//! - [`HlaMetadataResolver`]: the lookup contract used by expansion
//! - [`HlaMetadataDictionary`]: JSON-backed implementation, one indexed release per version
//! - [`CachingResolver`]: read-through cache in front of any resolver
//!
//! ## Example
//!
//! ```rust,no_run
//! use hla_match::catalog::cache::CachingResolver;
//! use hla_match::catalog::resolver::HlaMetadataResolver;
//! use hla_match::catalog::store::HlaMetadataDictionary;
//! use hla_match::core::types::Locus;
//! use std::path::Path;
//!
//! let dictionary = HlaMetadataDictionary::load_from_file(Path::new("dictionary.json.gz")).unwrap();
//! let resolver = CachingResolver::new(dictionary);
//!
//! let metadata = resolver.resolve(Locus::A, "01:AB", "3.33.0").unwrap();
//! println!("{:?}", metadata.p_groups);
//! ```
//!
//! [`MatchingMetadata`]: crate::core::metadata::MatchingMetadata
//! [`HlaMetadataResolver`]: resolver::HlaMetadataResolver
//! [`HlaMetadataDictionary`]: store::HlaMetadataDictionary
//! [`CachingResolver`]: cache::CachingResolver

pub mod cache;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;
