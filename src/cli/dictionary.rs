use std::path::PathBuf;

use clap::Args;

use crate::catalog::store::{HlaMetadataDictionary, NomenclatureRelease};
use crate::cli::{load_dictionary, OutputFormat};
use crate::core::types::Locus;

#[derive(Args)]
pub struct DictionaryArgs {
    /// Nomenclature dictionary (JSON, optionally gzipped)
    #[arg(short, long, required = true)]
    pub dictionary: PathBuf,
}

/// Execute the dictionary command
///
/// # Errors
///
/// Returns an error if the dictionary cannot be loaded.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: DictionaryArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    let dictionary = load_dictionary(&args.dictionary)?;

    match format {
        OutputFormat::Text => print_text(&dictionary),
        OutputFormat::Json => print_json(&dictionary)?,
        OutputFormat::Tsv => print_tsv(&dictionary),
    }

    Ok(())
}

fn releases(dictionary: &HlaMetadataDictionary) -> impl Iterator<Item = &NomenclatureRelease> {
    dictionary
        .versions()
        .into_iter()
        .filter_map(|version| dictionary.release(version))
}

fn print_text(dictionary: &HlaMetadataDictionary) {
    println!(
        "{:<12} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "Version", "A", "B", "C", "DPB1", "DQB1", "DRB1", "NMDP codes"
    );
    println!("{}", "-".repeat(82));

    for release in releases(dictionary) {
        let counts: Vec<String> = Locus::ALL
            .iter()
            .map(|&locus| format!("{:>8}", release.locus(locus).len()))
            .collect();
        println!(
            "{:<12} {} {:>10}",
            release.nomenclature_version,
            counts.join(" "),
            release.nmdp_code_count()
        );
    }

    println!("\nTotal: {} releases", dictionary.len());
    if let Some(latest) = dictionary.latest_version() {
        println!("Latest: {latest}");
    }
}

fn print_json(dictionary: &HlaMetadataDictionary) -> anyhow::Result<()> {
    let output: Vec<_> = releases(dictionary)
        .map(|release| {
            let loci: serde_json::Map<String, serde_json::Value> = Locus::ALL
                .iter()
                .map(|&locus| {
                    let index = release.locus(locus);
                    (
                        locus.to_string(),
                        serde_json::json!({
                            "alleles": index.len(),
                            "serologies": index.serology_count(),
                        }),
                    )
                })
                .collect();
            serde_json::json!({
                "nomenclature_version": release.nomenclature_version,
                "nmdp_codes": release.nmdp_code_count(),
                "loci": loci,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(dictionary: &HlaMetadataDictionary) {
    println!("nomenclature_version\tlocus\talleles\tserologies\tnmdp_codes");
    for release in releases(dictionary) {
        for locus in Locus::ALL {
            let index = release.locus(locus);
            println!(
                "{}\t{}\t{}\t{}\t{}",
                release.nomenclature_version,
                locus,
                index.len(),
                index.serology_count(),
                release.nmdp_code_count()
            );
        }
    }
}
