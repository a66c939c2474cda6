//! Inspect command - decode a descriptor and show its attributes.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;
use serde_json::json;
use std::fmt::Write as _;
use std::path::PathBuf;

use smb_core::BucketMetadata;
use smb_core::observability::descriptor_span;

use super::load_descriptor;
use crate::{Config, OutputFormat};

/// Arguments for the inspect command.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Descriptor file to inspect.
    #[arg()]
    pub file: PathBuf,
}

/// Execute the inspect command.
///
/// # Errors
///
/// Returns an error if the descriptor cannot be read or decoded.
pub fn execute(args: &InspectArgs, config: &Config) -> Result<()> {
    let metadata = load_descriptor(&args.file)?;
    let span = descriptor_span(
        "inspect",
        metadata.key_field().as_str(),
        metadata.num_buckets(),
    );
    let _guard = span.enter();
    print!("{}", render(&metadata, &config.format)?);
    Ok(())
}

/// Renders the descriptor's attributes in `format`.
///
/// # Errors
///
/// Returns an error if JSON rendering fails.
pub fn render(metadata: &BucketMetadata, format: &OutputFormat) -> Result<String> {
    let items = metadata.display_data();
    let id = metadata.partitioning_id();
    let mut out = String::new();

    match format {
        OutputFormat::Json => {
            let attributes: serde_json::Map<String, serde_json::Value> = items
                .iter()
                .map(|item| {
                    let value = serde_json::to_value(&item.value)?;
                    Ok((item.key.to_string(), value))
                })
                .collect::<Result<_, serde_json::Error>>()?;
            let body = json!({
                "attributes": attributes,
                "filenamePrefix": metadata.filename_prefix(),
                "partitioningId": id,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
        }
        OutputFormat::Text => {
            writeln!(out, "{}", "Bucket descriptor".bold())?;
            for item in &items {
                writeln!(out, "  {:<16}{}", format!("{}:", item.key), item.value)?;
            }
            let prefix = metadata.filename_prefix();
            writeln!(out, "  {:<16}{}", "filenamePrefix:", prefix)?;
            writeln!(out, "  {:<16}{}", "partitioningId:", id.cyan())?;
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct AttributeRow {
                #[tabled(rename = "Field")]
                field: String,
                #[tabled(rename = "Value")]
                value: String,
            }

            let mut rows: Vec<_> = items
                .iter()
                .map(|item| AttributeRow {
                    field: item.key.to_string(),
                    value: item.value.to_string(),
                })
                .collect();
            rows.push(AttributeRow {
                field: "filenamePrefix".into(),
                value: metadata.filename_prefix().to_string(),
            });
            rows.push(AttributeRow {
                field: "partitioningId".into(),
                value: id.to_string(),
            });
            writeln!(out, "{}", Table::new(rows))?;
        }
    }

    Ok(out)
}
