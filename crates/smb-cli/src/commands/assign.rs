//! Assign command - compute bucket and shard for keys or records.

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::BufRead;
use std::path::PathBuf;

use smb_core::{BucketMetadata, BucketShardId};

use super::load_descriptor;
use crate::{Config, OutputFormat};

/// Arguments for the assign command.
#[derive(Debug, Args)]
pub struct AssignArgs {
    /// Descriptor file.
    #[arg()]
    pub file: PathBuf,

    /// Key literal: decimal for integer keys, base64url for byte keys.
    #[arg(long, conflicts_with = "records", required_unless_present = "records")]
    pub key: Option<String>,

    /// File of JSON records, one per line.
    #[arg(long)]
    pub records: Option<PathBuf>,
}

/// Assignment of one key or record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRow {
    /// 1-based input line; absent for `--key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// The key, when one was extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Bucket and shard, when assignment succeeded.
    #[serde(flatten)]
    pub id: Option<BucketShardId>,
    /// Why the record could not be assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Execute the assign command.
///
/// # Errors
///
/// Returns an error if the descriptor or records file cannot be read, or the
/// `--key` literal does not parse as the descriptor's key type.
pub fn execute(args: &AssignArgs, config: &Config) -> Result<()> {
    let metadata = load_descriptor(&args.file)?;
    let rows = if let Some(key) = &args.key {
        vec![assign_literal(&metadata, key)?]
    } else if let Some(path) = &args.records {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let lines = std::io::BufReader::new(file)
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("failed to read {}", path.display()))?;
        assign_lines(&metadata, lines.iter().map(String::as_str))
    } else {
        anyhow::bail!("Either provide --key or --records")
    };
    print!("{}", render(&rows, &config.format)?);
    Ok(())
}

/// Assigns a textual key literal.
///
/// # Errors
///
/// Returns an error if `literal` does not parse as the descriptor's key type.
pub fn assign_literal(metadata: &BucketMetadata, literal: &str) -> Result<AssignmentRow> {
    let key = metadata.key_type().parse_key(literal)?;
    Ok(AssignmentRow {
        line: None,
        key: Some(key.to_string()),
        id: Some(metadata.assign(&key)),
        error: None,
    })
}

/// Assigns every non-blank JSON line. Failures are reported per line.
pub fn assign_lines<'a>(
    metadata: &BucketMetadata,
    lines: impl IntoIterator<Item = &'a str>,
) -> Vec<AssignmentRow> {
    lines
        .into_iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let line_no = Some(index + 1);
            let result = serde_json::from_str::<serde_json::Value>(line)
                .map_err(|e| format!("invalid JSON: {e}"))
                .and_then(|record| metadata.extract_key(&record).map_err(|e| e.to_string()));
            match result {
                Ok(key) => AssignmentRow {
                    line: line_no,
                    key: Some(key.to_string()),
                    id: Some(metadata.assign(&key)),
                    error: None,
                },
                Err(error) => {
                    tracing::debug!(line = index + 1, %error, "record not assigned");
                    AssignmentRow {
                        line: line_no,
                        key: None,
                        id: None,
                        error: Some(error),
                    }
                }
            }
        })
        .collect()
}

/// Renders assignments in `format`.
///
/// # Errors
///
/// Returns an error if JSON rendering fails.
pub fn render(rows: &[AssignmentRow], format: &OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(rows)?)?;
        }
        OutputFormat::Text => {
            for row in rows {
                let prefix = row.line.map_or(String::new(), |n| format!("{n}: "));
                match (&row.id, &row.error) {
                    (Some(id), _) => writeln!(
                        out,
                        "{prefix}{} -> {id}",
                        row.key.as_deref().unwrap_or_default()
                    )?,
                    (None, Some(error)) => writeln!(out, "{prefix}{}", error.red())?,
                    (None, None) => {}
                }
            }
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct Row {
                #[tabled(rename = "Line")]
                line: String,
                #[tabled(rename = "Key")]
                key: String,
                #[tabled(rename = "Bucket")]
                bucket: String,
                #[tabled(rename = "Shard")]
                shard: String,
                #[tabled(rename = "Error")]
                error: String,
            }

            let table_rows: Vec<_> = rows
                .iter()
                .map(|r| Row {
                    line: r.line.map(|n| n.to_string()).unwrap_or_default(),
                    key: r.key.clone().unwrap_or_default(),
                    bucket: r.id.map(|id| id.bucket.to_string()).unwrap_or_default(),
                    shard: r.id.map(|id| id.shard.to_string()).unwrap_or_default(),
                    error: r.error.clone().unwrap_or_default(),
                })
                .collect();
            writeln!(out, "{}", Table::new(table_rows))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smb_core::{Key, KeyType};
    use smb_test_utils::DescriptorFactory;

    #[test]
    fn test_literal_key() {
        let metadata = DescriptorFactory::by_key("country").layout(16, 4);
        let row = assign_literal(&metadata, "US").unwrap();
        let id = row.id.unwrap();
        assert_eq!((id.bucket, id.shard), (12, 0));
    }

    #[test]
    fn test_bad_integer_literal() {
        let metadata = DescriptorFactory::by_key("id")
            .key_type(KeyType::Int64)
            .buckets(4);
        assert!(assign_literal(&metadata, "twelve").is_err());
    }

    #[test]
    fn test_records_report_failures_per_line() {
        let metadata = DescriptorFactory::by_key("location.currentCountry").layout(16, 4);
        let lines = [
            r#"{"location":{"currentCountry":"US"}}"#,
            "",
            r#"{"location":{}}"#,
            "not json",
        ];
        let rows = assign_lines(&metadata, lines);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].line, Some(1));
        assert_eq!(rows[0].id, Some(metadata.assign(&Key::from("US"))));
        assert_eq!(rows[1].line, Some(3));
        assert!(rows[1].error.as_deref().unwrap().contains("currentCountry"));
        assert!(rows[2].error.as_deref().unwrap().starts_with("invalid JSON"));
    }

    #[test]
    fn test_json_rows_flatten_ids() {
        let metadata = DescriptorFactory::by_key("k").layout(16, 4);
        let rows = vec![assign_literal(&metadata, "US").unwrap()];
        let json: serde_json::Value =
            serde_json::from_str(&render(&rows, &OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json[0]["bucket"], 12);
        assert_eq!(json[0]["key"], "US");
    }

    #[test]
    fn test_key_and_records_conflict() {
        use clap::Parser;
        let both = "smb assign d.json --key 1 --records r.jsonl";
        assert!(crate::Cli::try_parse_from(both.split_whitespace()).is_err());
        assert!(crate::Cli::try_parse_from(["smb", "assign", "d.json"]).is_err());
    }
}
