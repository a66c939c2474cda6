//! Check command - pairwise partition compatibility.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

use smb_core::{BucketMetadata, CompatibilityReport, MergePlan};

use super::load_descriptors;
use crate::{Config, OutputFormat};

/// Arguments for the check command.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Descriptor files to compare (at least two).
    #[arg(required = true, num_args = 2..)]
    pub files: Vec<PathBuf>,
}

/// Compatibility of one pair of inputs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairResult {
    /// Index of the left input.
    pub left: usize,
    /// Index of the right input.
    pub right: usize,
    /// The comparison.
    pub report: CompatibilityReport,
}

/// Result of checking every pair.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    /// Input file names, by index.
    pub inputs: Vec<String>,
    /// One entry per unordered pair.
    pub pairs: Vec<PairResult>,
    /// The merged bucket count, when every pair is compatible.
    pub target_buckets: Option<u32>,
}

impl CheckOutcome {
    /// Compares every pair of `descriptors`.
    #[must_use]
    pub fn compute(inputs: Vec<String>, descriptors: &[BucketMetadata]) -> Self {
        let mut pairs = Vec::new();
        for (i, left) in descriptors.iter().enumerate() {
            for (j, right) in descriptors.iter().enumerate().skip(i + 1) {
                pairs.push(PairResult {
                    left: i,
                    right: j,
                    report: left.compatibility(right),
                });
            }
        }
        let refs: Vec<&BucketMetadata> = descriptors.iter().collect();
        Self {
            inputs,
            pairs,
            target_buckets: MergePlan::plan(&refs).map(|p| p.target_buckets()),
        }
    }

    /// Returns the number of incompatible pairs.
    #[must_use]
    pub fn incompatible_pairs(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| !p.report.is_compatible())
            .count()
    }
}

/// Execute the check command.
///
/// # Errors
///
/// Returns an error if a descriptor cannot be loaded or any pair is incompatible.
pub fn execute(args: &CheckArgs, config: &Config) -> Result<()> {
    let descriptors = load_descriptors(&args.files)?;
    let inputs = args
        .files
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let outcome = CheckOutcome::compute(inputs, &descriptors);
    print!("{}", render(&outcome, &config.format)?);

    let failed = outcome.incompatible_pairs();
    if failed > 0 {
        anyhow::bail!("{failed} incompatible descriptor pair(s)");
    }
    Ok(())
}

/// Renders a check outcome in `format`.
///
/// # Errors
///
/// Returns an error if JSON rendering fails.
pub fn render(outcome: &CheckOutcome, format: &OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(outcome)?)?;
        }
        OutputFormat::Text => {
            for pair in &outcome.pairs {
                let names = format!(
                    "{} <-> {}",
                    outcome.inputs[pair.left], outcome.inputs[pair.right]
                );
                if pair.report.is_compatible() {
                    writeln!(out, "{} {names}", "compatible".green())?;
                } else {
                    writeln!(out, "{} {names}", "incompatible".red())?;
                    for mismatch in pair.report.mismatches() {
                        writeln!(out, "    {mismatch}")?;
                    }
                }
            }
            match outcome.target_buckets {
                Some(n) => writeln!(out, "merge target: {n} buckets")?,
                None => writeln!(out, "merge target: {}", "none".dimmed())?,
            }
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct PairRow {
                #[tabled(rename = "Left")]
                left: String,
                #[tabled(rename = "Right")]
                right: String,
                #[tabled(rename = "Compatible")]
                compatible: bool,
                #[tabled(rename = "Mismatches")]
                mismatches: String,
            }

            let rows: Vec<_> = outcome
                .pairs
                .iter()
                .map(|p| PairRow {
                    left: outcome.inputs[p.left].clone(),
                    right: outcome.inputs[p.right].clone(),
                    compatible: p.report.is_compatible(),
                    mismatches: p
                        .report
                        .mismatches()
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; "),
                })
                .collect();
            writeln!(out, "{}", Table::new(rows))?;
        }
    }
    Ok(out)
}
