//! # hla-match
//!
//! A library for matching and scoring stem-cell and cord-blood donors against
//! a patient by HLA typing.
//!
//! Registry typings come at very different resolutions: full alleles, allele
//! strings, NMDP multiple-allele codes, XX codes and serologies. `hla-match`
//! resolves each of them against a pinned nomenclature release into the sets
//! of P-groups, G-groups and DPB1 TCE groups they may stand for, then compares
//! patient and donor at every locus.
//!
//! ## Features
//!
//! - **Locus matching**: match counts of 0, 1 or 2 per locus, with the
//!   orientation that reached them and homozygous handling
//! - **Mismatch criteria**: per-locus and total mismatch ceilings
//! - **Position scoring**: a grade (gDNA down to mismatch) and a confidence
//!   for every donor position
//! - **Donor categories**: Definite, Exact, Potential or Mismatch per donor
//! - **Batch search**: concurrent evaluation of a donor pool with cancellation
//!   and per-donor failure isolation
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use hla_match::{
//!     DonorRecord, DonorType, HlaMetadataDictionary, Locus, MatchCriteria, MatchingEngine,
//!     PhenotypeExpander, RawPhenotype,
//! };
//!
//! let dictionary = HlaMetadataDictionary::load_from_file(Path::new("dictionary.json")).unwrap();
//! let expander = PhenotypeExpander::new(Arc::new(dictionary), "3.33.0");
//!
//! let patient = RawPhenotype::untyped()
//!     .with_locus(Locus::A, "01:01", "02:01")
//!     .with_locus(Locus::B, "07:02", "08:01")
//!     .with_locus(Locus::Drb1, "15:01", "03:01");
//! let patient = expander.expand(&patient).unwrap();
//!
//! let criteria = MatchCriteria::builder(DonorType::Adult)
//!     .locus(Locus::A, 0)
//!     .locus(Locus::B, 1)
//!     .locus(Locus::Drb1, 0)
//!     .score_loci(Locus::ALL)
//!     .build()
//!     .unwrap();
//!
//! let engine = MatchingEngine::new(&patient, &criteria);
//! let donor = DonorRecord::new(
//!     "D-0001",
//!     DonorType::Adult,
//!     chrono::Utc::now(),
//!     RawPhenotype::untyped()
//!         .with_locus(Locus::A, "01:01", "02:01")
//!         .with_locus(Locus::B, "07:02", "44:02")
//!         .with_locus(Locus::Drb1, "15:01", "03:01"),
//! );
//! let candidate = expander.expand_donor(&donor).unwrap();
//! let evaluation = engine.evaluate(&candidate);
//! println!("{}: {:?}", evaluation.donor_id, evaluation.verdict);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Nomenclature dictionary, typing resolution and caching
//! - [`core`]: Loci, phenotypes, typings and donor records
//! - [`matching`]: Expansion, locus matching, criteria, scoring and aggregation
//! - [`search`]: Search requests, donor sources and the batch runner
//! - [`parsing`]: Donor and request files in JSON, TSV and CSV
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod search;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::cache::CachingResolver;
pub use catalog::resolver::{HlaMetadataResolver, ResolutionError};
pub use catalog::store::HlaMetadataDictionary;
pub use core::donor::{DonorCandidate, DonorId, DonorRecord};
pub use core::metadata::MatchingMetadata;
pub use core::phenotype::{LociInfo, LocusInfo, PhenotypeInfo, RawPhenotype};
pub use core::types::*;
pub use matching::criteria::{DonorFilter, MatchCriteria, MatchVerdict};
pub use matching::engine::{DonorEvaluation, MatchResult, MatchingEngine, ScoreResult};
pub use matching::expansion::{ExpandedPhenotype, PhenotypeExpander};
pub use search::runner::{CancellationFlag, SearchConfig, SearchOutcome, SearchRunner};
