//! HLA donor matching and scoring.
//!
//! The per-donor pipeline runs in five steps:
//!
//! 1. **Expansion** ([`PhenotypeExpander`]): raw typings become matching metadata
//! 2. **Locus matching** ([`match_locus`]): match count 0/1/2 per locus, direct or crossed
//! 3. **Mismatch filtering** ([`MatchCriteria::evaluate`]): per-locus and total ceilings
//! 4. **Scoring** ([`score_locus`]): a grade and confidence per donor position
//! 5. **Aggregation** ([`aggregate_category`]): one match category per donor
//!
//! [`MatchingEngine`] runs steps 2–5 for one donor against an expanded patient.
//!
//! ## Grades
//!
//! | Grade                | Shared at                                  |
//! |----------------------|--------------------------------------------|
//! | `GDna`               | same allele, full genomic sequence          |
//! | `CDna`               | first three fields, full sequence           |
//! | `Protein`            | first two fields                           |
//! | `GGroup` / `PGroup`  | G-group / P-group                          |
//! | `PermissiveMismatch` | DPB1 T-cell epitope group only              |
//! | `Null*`              | both positions null                        |
//! | `ExpressingVsNull`   | one null, one expressing position          |
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hla_match::catalog::store::HlaMetadataDictionary;
//! use hla_match::core::donor::DonorRecord;
//! use hla_match::core::phenotype::RawPhenotype;
//! use hla_match::core::types::{DonorType, Locus};
//! use hla_match::matching::criteria::MatchCriteria;
//! use hla_match::matching::engine::MatchingEngine;
//! use hla_match::matching::expansion::PhenotypeExpander;
//! use std::path::Path;
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
//!     .locus(Locus::A, 1)
//!     .locus(Locus::B, 1)
//!     .locus(Locus::Drb1, 0)
//!     .total_mismatches(1)
//!     .score_loci([Locus::A, Locus::B, Locus::Drb1])
//!     .build()
//!     .unwrap();
//!
//! let engine = MatchingEngine::new(&patient, &criteria);
//! let record = DonorRecord::new(
//!     "D-0001",
//!     DonorType::Adult,
//!     chrono::Utc::now(),
//!     RawPhenotype::untyped()
//!         .with_locus(Locus::A, "01:01", "02:01")
//!         .with_locus(Locus::B, "07:02", "44:02")
//!         .with_locus(Locus::Drb1, "15:01", "03:01"),
//! );
//! let donor = expander.expand_donor(&record).unwrap();
//! let evaluation = engine.evaluate(&donor);
//! println!("{:?}", evaluation.verdict);
//! ```
//!
//! [`PhenotypeExpander`]: expansion::PhenotypeExpander
//! [`match_locus`]: locus::match_locus
//! [`MatchCriteria::evaluate`]: criteria::MatchCriteria::evaluate
//! [`score_locus`]: scoring::score_locus
//! [`aggregate_category`]: aggregate::aggregate_category
//! [`MatchingEngine`]: engine::MatchingEngine

pub mod aggregate;
pub mod criteria;
pub mod engine;
pub mod expansion;
pub mod locus;
pub mod scoring;
