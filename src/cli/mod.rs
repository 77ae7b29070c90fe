//! Command-line interface for hla-match.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **search**: Search a donor file for a patient described by a search request
//! - **score**: Match and score one patient/donor locus pair
//! - **expand**: Show the matching metadata a typing resolves to
//! - **dictionary**: Summarise the releases in a nomenclature dictionary
//!
//! ## Usage
//!
//! ```text
//! # Search a registry export
//! hla-match search -d dictionary.json -r request.json --donors donors.tsv
//!
//! # JSON output for scripting
//! hla-match search -d dictionary.json -r request.json --donors donors.json --format json
//!
//! # Compare a single locus
//! hla-match score -d dictionary.json --locus A --patient 01:01 --patient 02:01 --donor 01:AB --donor 02:01
//!
//! # Inspect a typing
//! hla-match expand -d dictionary.json --locus DRB1 15:01 03:XX
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::catalog::cache::CachingResolver;
use crate::catalog::store::HlaMetadataDictionary;
use crate::matching::expansion::PhenotypeExpander;

pub mod dictionary;
pub mod expand;
pub mod score;
pub mod search;

#[derive(Parser)]
#[command(name = "hla-match")]
#[command(version)]
#[command(about = "Match and score HLA-typed donors against a patient")]
#[command(
    long_about = "hla-match resolves HLA typings (alleles, allele strings, NMDP and XX codes, serologies) against a nomenclature dictionary and matches donors against a patient.\n\nFor every donor it reports:\n- Match counts per locus under configurable mismatch ceilings\n- Position-level match grades and confidences\n- A donor-level match category used for ranking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search a donor file for matches to a patient
    Search(search::SearchArgs),

    /// Match and score a single locus
    Score(score::ScoreArgs),

    /// Show the matching metadata of typings
    Expand(expand::ExpandArgs),

    /// Summarise a nomenclature dictionary
    Dictionary(dictionary::DictionaryArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

pub(crate) fn load_dictionary(path: &Path) -> anyhow::Result<HlaMetadataDictionary> {
    let dictionary = HlaMetadataDictionary::load_from_file(path)
        .with_context(|| format!("Failed to load dictionary {}", path.display()))?;
    if dictionary.is_empty() {
        bail!("Dictionary {} has no nomenclature releases", path.display());
    }
    Ok(dictionary)
}

/// The requested nomenclature version, or the dictionary's latest
pub(crate) fn pick_version(
    dictionary: &HlaMetadataDictionary,
    requested: Option<&str>,
) -> anyhow::Result<String> {
    match requested {
        Some(version) if dictionary.release(version).is_some() => Ok(version.to_string()),
        Some(version) => bail!(
            "Nomenclature version {} not in dictionary (available: {})",
            version,
            dictionary.versions().join(", ")
        ),
        None => dictionary
            .latest_version()
            .map(str::to_string)
            .context("Dictionary has no nomenclature releases"),
    }
}

/// A cached expander over `dictionary` pinned to `version`
pub(crate) fn build_expander(dictionary: HlaMetadataDictionary, version: &str) -> PhenotypeExpander {
    PhenotypeExpander::new(Arc::new(CachingResolver::new(dictionary)), version)
}
