//! Search command - evaluate a donor file against a search request.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use crate::cli::{build_expander, load_dictionary, pick_version, OutputFormat};
use crate::core::types::Locus;
use crate::matching::criteria::MatchVerdict;
use crate::matching::engine::DonorEvaluation;
use crate::parsing::{json::parse_request_file, load_donor_pool};
use crate::search::runner::{CancellationFlag, SearchConfig, SearchOutcome, SearchRunner};

/// Arguments for the search command
#[derive(Args)]
pub struct SearchArgs {
    /// Nomenclature dictionary (JSON, optionally gzipped)
    #[arg(short, long, required = true)]
    pub dictionary: PathBuf,

    /// Search request (JSON)
    #[arg(short, long, required = true)]
    pub request: PathBuf,

    /// Donor file (JSON, TSV or CSV, optionally gzipped)
    #[arg(long, required = true)]
    pub donors: PathBuf,

    /// Number of concurrent donor workers (defaults to available CPUs)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Maximum number of donors to report
    #[arg(short = 'n', long, default_value = "50")]
    pub max_results: usize,

    /// Also report donors rejected by the mismatch ceilings
    #[arg(long)]
    pub include_rejected: bool,
}

/// Execute the search command
///
/// # Errors
///
/// Returns an error if the dictionary, request or donor file cannot be read,
/// the request is invalid, or the patient typings cannot be resolved.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: SearchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let dictionary = load_dictionary(&args.dictionary)?;

    let request = parse_request_file(&args.request)
        .with_context(|| format!("Failed to read request {}", args.request.display()))?;
    let search = request.validate().context("Invalid search request")?;
    let version = pick_version(&dictionary, search.nomenclature_version.as_deref())?;

    let pool = load_donor_pool(&args.donors)
        .with_context(|| format!("Failed to read donors {}", args.donors.display()))?;
    if verbose {
        eprintln!(
            "Loaded {} donors; nomenclature version {}",
            pool.len(),
            version
        );
    }

    let mut config = SearchConfig {
        include_rejected: args.include_rejected,
        ..SearchConfig::default()
    };
    if let Some(workers) = args.workers {
        config.workers = workers.max(1);
    }

    let runner = SearchRunner::new(build_expander(dictionary, &version), config);
    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt
        .block_on(runner.run(
            &search.patient,
            Arc::new(search.criteria),
            search.filter,
            Arc::new(pool),
            CancellationFlag::new(),
        ))?
        .ranked();

    match format {
        OutputFormat::Text => print_text(&outcome, &version, args.max_results),
        OutputFormat::Json => print_json(&outcome, &version, args.max_results)?,
        OutputFormat::Tsv => print_tsv(&outcome, args.max_results),
    }

    Ok(())
}

fn locus_summary(evaluation: &DonorEvaluation, locus: Locus) -> Option<String> {
    let matched = evaluation
        .match_result
        .locus(locus)
        .map(|d| format!("{}/2", d.match_count));
    let scored = evaluation
        .score_result
        .as_ref()
        .and_then(|s| s.locus(locus))
        .map(|details| match &details.scores {
            Some(scores) => format!(
                "{} {} | {} {}",
                scores.position_1.grade,
                scores.position_1.confidence,
                scores.position_2.grade,
                scores.position_2.confidence
            ),
            None => "untyped".to_string(),
        });

    match (matched, scored) {
        (None, None) => None,
        (Some(m), None) => Some(m),
        (None, Some(s)) => Some(format!("-   {s}")),
        (Some(m), Some(s)) => Some(format!("{m} {s}")),
    }
}

fn print_text(outcome: &SearchOutcome, version: &str, max_results: usize) {
    println!("\nSearch (nomenclature {version})");
    println!(
        "   Donors: {} considered, {} filtered, {} rejected, {} accepted, {} failed",
        outcome.donors_considered,
        outcome.filtered_count,
        outcome.rejected_count,
        outcome.accepted_count(),
        outcome.failures.len()
    );
    if outcome.cancelled {
        println!("   Search was cancelled; results are partial");
    }

    if outcome.results.is_empty() {
        println!("\nNo matching donors found.");
    }

    for (i, evaluation) in outcome.results.iter().take(max_results).enumerate() {
        let category = evaluation
            .score_result
            .as_ref()
            .and_then(|s| s.aggregate)
            .map_or_else(|| "-".to_string(), |a| a.category.to_string());
        let status = if evaluation.is_accepted() {
            "accepted"
        } else {
            "rejected"
        };

        println!(
            "\n#{} {} ({}) - {} matches, {} mismatches, {}, category {}",
            i + 1,
            evaluation.donor_id,
            evaluation.donor_type,
            evaluation.match_result.total_match_count,
            evaluation.match_result.total_mismatch_count,
            status,
            category
        );
        if let MatchVerdict::Reject(reason) = &evaluation.verdict {
            println!("   {reason}");
        }
        for locus in Locus::ALL {
            if let Some(summary) = locus_summary(evaluation, locus) {
                println!("   {:<5} {}", locus.to_string(), summary);
            }
        }
    }

    if outcome.results.len() > max_results {
        println!(
            "\n({} more not shown, use --max-results to see more)",
            outcome.results.len() - max_results
        );
    }

    for failure in &outcome.failures {
        println!("\nSkipped {}: {}", failure.donor_id, failure.reason);
    }
}

fn print_json(outcome: &SearchOutcome, version: &str, max_results: usize) -> anyhow::Result<()> {
    let results: Vec<&DonorEvaluation> = outcome.results.iter().take(max_results).collect();
    let output = serde_json::json!({
        "nomenclature_version": version,
        "donors_considered": outcome.donors_considered,
        "filtered_count": outcome.filtered_count,
        "rejected_count": outcome.rejected_count,
        "accepted_count": outcome.accepted_count(),
        "cancelled": outcome.cancelled,
        "results": results,
        "failures": outcome.failures,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(outcome: &SearchOutcome, max_results: usize) {
    let mut header = vec![
        "rank".to_string(),
        "donor_id".to_string(),
        "donor_type".to_string(),
        "accepted".to_string(),
        "match_count".to_string(),
        "mismatch_count".to_string(),
        "category".to_string(),
        "grade_score".to_string(),
        "confidence_score".to_string(),
    ];
    for locus in Locus::ALL {
        header.push(format!("{locus}_matches"));
        header.push(format!("{locus}_grade_1"));
        header.push(format!("{locus}_grade_2"));
    }
    println!("{}", header.join("\t"));

    for (i, evaluation) in outcome.results.iter().take(max_results).enumerate() {
        let aggregate = evaluation.score_result.as_ref().and_then(|s| s.aggregate);
        let mut row = vec![
            (i + 1).to_string(),
            evaluation.donor_id.to_string(),
            evaluation.donor_type.to_string(),
            evaluation.is_accepted().to_string(),
            evaluation.match_result.total_match_count.to_string(),
            evaluation.match_result.total_mismatch_count.to_string(),
            aggregate.map(|a| a.category.to_string()).unwrap_or_default(),
            aggregate.map(|a| a.grade_score.to_string()).unwrap_or_default(),
            aggregate
                .map(|a| a.confidence_score.to_string())
                .unwrap_or_default(),
        ];
        for locus in Locus::ALL {
            row.push(
                evaluation
                    .match_result
                    .locus(locus)
                    .map(|d| d.match_count.to_string())
                    .unwrap_or_default(),
            );
            let scores = evaluation
                .score_result
                .as_ref()
                .and_then(|s| s.locus(locus))
                .and_then(|d| d.scores);
            row.push(scores.map(|s| s.position_1.grade.to_string()).unwrap_or_default());
            row.push(scores.map(|s| s.position_2.grade.to_string()).unwrap_or_default());
        }
        println!("{}", row.join("\t"));
    }
}
