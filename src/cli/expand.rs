//! Expand command - show what a typing resolves to.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::catalog::resolver::HlaMetadataResolver;
use crate::cli::{load_dictionary, pick_version, OutputFormat};
use crate::core::metadata::MatchingMetadata;
use crate::core::types::Locus;

/// Arguments for the expand command
#[derive(Args)]
pub struct ExpandArgs {
    /// Nomenclature dictionary (JSON, optionally gzipped)
    #[arg(short, long, required = true)]
    pub dictionary: PathBuf,

    /// Locus the typings belong to
    #[arg(short, long, required = true)]
    pub locus: Locus,

    /// Typings to resolve
    #[arg(required = true)]
    pub typings: Vec<String>,

    /// Nomenclature version (defaults to the dictionary's latest)
    #[arg(long)]
    pub nomenclature_version: Option<String>,

    /// List every candidate allele
    #[arg(long)]
    pub all_alleles: bool,
}

/// Execute the expand command
///
/// # Errors
///
/// Returns an error if the dictionary cannot be loaded or any typing cannot
/// be resolved.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ExpandArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let dictionary = load_dictionary(&args.dictionary)?;
    let version = pick_version(&dictionary, args.nomenclature_version.as_deref())?;
    if verbose {
        eprintln!("Nomenclature version {version}");
    }

    let expanded = args
        .typings
        .iter()
        .map(|typing| dictionary.resolve(args.locus, typing, &version))
        .collect::<Result<Vec<Arc<MatchingMetadata>>, _>>()?;

    match format {
        OutputFormat::Text => {
            for metadata in &expanded {
                print_text(metadata, args.all_alleles);
            }
        }
        OutputFormat::Json => {
            let typings: Vec<&MatchingMetadata> = expanded.iter().map(|m| &**m).collect();
            let output = serde_json::json!({
                "locus": args.locus,
                "nomenclature_version": version,
                "typings": typings,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("locus\ttyping\tcategory\texpression\talleles\tp_groups\tg_groups\ttce_groups");
            for metadata in &expanded {
                println!(
                    "{}\t{}\t{}\t{:?}\t{}\t{}\t{}\t{}",
                    metadata.locus,
                    metadata.lookup_name,
                    metadata.typing_category,
                    metadata.expression,
                    metadata.alleles.len(),
                    join(&metadata.p_groups),
                    join(&metadata.g_groups),
                    join(&metadata.tce_groups),
                );
            }
        }
    }

    Ok(())
}

fn join<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn print_text(metadata: &MatchingMetadata, all_alleles: bool) {
    println!("\n{}*{}", metadata.locus, metadata.lookup_name);
    println!("   Category:   {}", metadata.typing_category);
    println!("   Expression: {:?}", metadata.expression);
    println!("   P-groups:   {}", or_none(&join(&metadata.p_groups)));
    println!("   G-groups:   {}", or_none(&join(&metadata.g_groups)));
    if !metadata.tce_groups.is_empty() {
        println!("   TCE groups: {}", join(&metadata.tce_groups));
    }

    println!("   Alleles:    {}", metadata.alleles.len());
    let shown = if all_alleles { metadata.alleles.len() } else { 10 };
    for allele in metadata.alleles.iter().take(shown) {
        let p_group = allele.p_group.as_deref().unwrap_or("-");
        println!(
            "      {:<16} P {:<10} G {}",
            allele.name,
            p_group,
            allele.g_group
        );
    }
    if metadata.alleles.len() > shown {
        println!(
            "      ... and {} more (use --all-alleles to see all)",
            metadata.alleles.len() - shown
        );
    }
}

fn or_none(s: &str) -> &str {
    if s.is_empty() {
        "none"
    } else {
        s
    }
}
