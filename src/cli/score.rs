//! Score command - match and score one locus without a donor file.
//!
//! Useful for checking how two typings compare: the locus match count, the
//! orientation that reached it, and the grade and confidence per donor position.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{build_expander, load_dictionary, pick_version, OutputFormat};
use crate::core::phenotype::LocusInfo;
use crate::core::types::{Locus, LocusPosition};
use crate::matching::expansion::PhenotypeExpander;
use crate::matching::locus::{match_locus, LocusMatchDetails};
use crate::matching::scoring::{score_locus, LocusScoreDetails};

/// Arguments for the score command
#[derive(Args)]
pub struct ScoreArgs {
    /// Nomenclature dictionary (JSON, optionally gzipped)
    #[arg(short, long, required = true)]
    pub dictionary: PathBuf,

    /// Locus to compare (A, B, C, DPB1, DQB1, DRB1)
    #[arg(short, long, required = true)]
    pub locus: Locus,

    /// Patient typing; give once for a homozygous locus, twice otherwise
    #[arg(long, required = true, num_args = 1, action = clap::ArgAction::Append)]
    pub patient: Vec<String>,

    /// Donor typing; give once for a homozygous locus, twice otherwise
    #[arg(long, required = true, num_args = 1, action = clap::ArgAction::Append)]
    pub donor: Vec<String>,

    /// Nomenclature version (defaults to the dictionary's latest)
    #[arg(long)]
    pub nomenclature_version: Option<String>,
}

/// Match and score outcome for one locus
struct LocusComparison {
    locus: Locus,
    version: String,
    patient: Vec<String>,
    donor: Vec<String>,
    details: LocusMatchDetails,
    scores: LocusScoreDetails,
}

/// Execute the score command
///
/// # Errors
///
/// Returns an error if the dictionary cannot be loaded, more than two typings
/// are given for a side, or a typing cannot be resolved.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ScoreArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if args.patient.len() > 2 || args.donor.len() > 2 {
        anyhow::bail!("At most two typings per side can be given");
    }

    let dictionary = load_dictionary(&args.dictionary)?;
    let version = pick_version(&dictionary, args.nomenclature_version.as_deref())?;
    if verbose {
        eprintln!("Nomenclature version {version}");
    }
    let expander = build_expander(dictionary, &version);

    let comparison = compare(&expander, args.locus, &args.patient, &args.donor)?;

    match format {
        OutputFormat::Text => print_text(&comparison),
        OutputFormat::Json => print_json(&comparison)?,
        OutputFormat::Tsv => print_tsv(&comparison),
    }

    Ok(())
}

fn slots(typings: &[String]) -> LocusInfo<Option<String>> {
    LocusInfo::new(typings.first().cloned(), typings.get(1).cloned())
}

fn compare(
    expander: &PhenotypeExpander,
    locus: Locus,
    patient: &[String],
    donor: &[String],
) -> anyhow::Result<LocusComparison> {
    let patient_locus = expander.expand_locus(locus, &slots(patient))?;
    let donor_locus = expander.expand_locus(locus, &slots(donor))?;

    Ok(LocusComparison {
        locus,
        version: expander.nomenclature_version().to_string(),
        patient: patient.to_vec(),
        donor: donor.to_vec(),
        details: match_locus(&patient_locus, &donor_locus),
        scores: score_locus(locus, &patient_locus, &donor_locus),
    })
}

fn print_text(comparison: &LocusComparison) {
    println!(
        "\nLocus {} (nomenclature {})",
        comparison.locus, comparison.version
    );
    println!("   Patient: {}", comparison.patient.join(" + "));
    println!("   Donor:   {}", comparison.donor.join(" + "));
    println!(
        "\n   Match count: {}/2 ({:?})",
        comparison.details.match_count, comparison.details.orientations
    );

    match &comparison.scores.scores {
        Some(scores) => {
            for (position, score) in scores.iter() {
                println!(
                    "   Donor position {}: {} ({})",
                    position, score.grade, score.confidence
                );
            }
        }
        None => println!("   Not scored: locus untyped"),
    }
}

fn print_json(comparison: &LocusComparison) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "locus": comparison.locus,
        "nomenclature_version": comparison.version,
        "patient": comparison.patient,
        "donor": comparison.donor,
        "match": comparison.details,
        "score": comparison.scores,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(comparison: &LocusComparison) {
    println!("locus\tmatch_count\torientation\tposition\tgrade\tconfidence");
    for position in LocusPosition::BOTH {
        let (grade, confidence) = comparison
            .scores
            .scores
            .map(|s| {
                let score = s.get(position);
                (score.grade.to_string(), score.confidence.to_string())
            })
            .unwrap_or_default();
        println!(
            "{}\t{}\t{:?}\t{}\t{}\t{}",
            comparison.locus,
            comparison.details.match_count,
            comparison.details.orientations,
            position,
            grade,
            confidence
        );
    }
}
