//! Core data types for HLA donor matching.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Locus`], [`LocusPosition`]: the loci and the two inherited copies at each
//! - [`LocusInfo`], [`LociInfo`], [`PhenotypeInfo`]: per-position and per-locus containers
//! - [`MatchingMetadata`]: a typing resolved to its P-groups, G-groups and expression
//! - [`DonorRecord`], [`DonorCandidate`]: donors before and after expansion
//! - [`MatchGrade`], [`MatchConfidence`], [`MatchCategory`]: result classification types
//!
//! ## Typings
//!
//! Raw typings come in several shapes, each reaching a different best grade:
//!
//! | Shape          | Example        | Best grade |
//! |----------------|----------------|------------|
//! | Single allele  | `01:01:01:01`  | gDNA       |
//! | Allele string  | `02:15N/02:32` | gDNA       |
//! | NMDP code      | `01:AB`        | G-group    |
//! | XX code        | `01:XX`        | G-group    |
//! | Serology       | `1`            | P-group    |
//!
//! [`Locus`]: types::Locus
//! [`LocusPosition`]: types::LocusPosition
//! [`LocusInfo`]: phenotype::LocusInfo
//! [`LociInfo`]: phenotype::LociInfo
//! [`PhenotypeInfo`]: phenotype::PhenotypeInfo
//! [`MatchingMetadata`]: metadata::MatchingMetadata
//! [`DonorRecord`]: donor::DonorRecord
//! [`DonorCandidate`]: donor::DonorCandidate
//! [`MatchGrade`]: types::MatchGrade
//! [`MatchConfidence`]: types::MatchConfidence
//! [`MatchCategory`]: types::MatchCategory

pub mod donor;
pub mod metadata;
pub mod phenotype;
pub mod types;
pub mod typing;
