//! Plan command - show which source buckets each merged bucket reads.

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::OwoColorize;
use serde::{Serialize, Serializer};
use std::fmt::Write as _;
use std::path::PathBuf;

use smb_core::{BucketMetadata, MergePlan};

use super::load_descriptors;
use crate::{Config, OutputFormat};

/// Arguments for the plan command.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Descriptor files of the datasets to merge.
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// List at most this many target buckets.
    #[arg(long)]
    pub limit: Option<u32>,
}

/// Execute the plan command.
///
/// # Errors
///
/// Returns an error if a descriptor cannot be loaded or the inputs are incompatible.
pub fn execute(args: &PlanArgs, config: &Config) -> Result<()> {
    let descriptors = load_descriptors(&args.files)?;
    let plan = plan_for(&descriptors)?;
    let inputs: Vec<String> = args
        .files
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    print!("{}", render(&plan, &inputs, args.limit, &config.format)?);
    Ok(())
}

/// Plans a merge of `descriptors`.
///
/// # Errors
///
/// Returns an error naming the problem when no plan exists.
pub fn plan_for(descriptors: &[BucketMetadata]) -> Result<MergePlan> {
    let refs: Vec<&BucketMetadata> = descriptors.iter().collect();
    MergePlan::plan(&refs)
        .context("descriptors are not partition compatible; run `smb check`")
}

/// JSON body of a plan; groups are serialized as they are generated.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanBody<'a> {
    inputs: &'a [String],
    target_buckets: u32,
    fan_in: Vec<u32>,
    #[serde(serialize_with = "serialize_groups")]
    groups: (&'a MergePlan, usize),
}

fn serialize_groups<S: Serializer>(
    &(plan, limit): &(&MergePlan, usize),
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(plan.groups().take(limit))
}

/// Renders a merge plan in `format`, listing at most `limit` target buckets.
///
/// # Errors
///
/// Returns an error if JSON rendering fails.
pub fn render(
    plan: &MergePlan,
    inputs: &[String],
    limit: Option<u32>,
    format: &OutputFormat,
) -> Result<String> {
    let limit = limit
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(usize::MAX);
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            let body = PlanBody {
                inputs,
                target_buckets: plan.target_buckets(),
                fan_in: plan.fan_in(),
                groups: (plan, limit),
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
        }
        OutputFormat::Text => {
            writeln!(
                out,
                "{} {} target buckets",
                "Merge plan:".bold(),
                plan.target_buckets()
            )?;
            for group in plan.groups().take(limit) {
                writeln!(out, "bucket {}", group.target_bucket)?;
                for (input, source) in inputs.iter().zip(&group.sources) {
                    writeln!(
                        out,
                        "  {input}: buckets {} x {} shard(s)",
                        source.buckets, source.num_shards
                    )?;
                }
            }
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct GroupRow {
                #[tabled(rename = "Target")]
                target: u32,
                #[tabled(rename = "Source")]
                source: String,
                #[tabled(rename = "Buckets")]
                buckets: String,
                #[tabled(rename = "Shards")]
                shards: u32,
            }

            let rows: Vec<_> = plan
                .groups()
                .take(limit)
                .flat_map(|group| {
                    let target = group.target_bucket;
                    inputs
                        .iter()
                        .zip(group.sources)
                        .map(move |(input, source)| GroupRow {
                            target,
                            source: input.clone(),
                            buckets: source.buckets.to_string(),
                            shards: source.num_shards,
                        })
                })
                .collect();
            writeln!(out, "{}", Table::new(rows))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smb_test_utils::DescriptorFactory;

    fn inputs() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    #[test]
    fn test_plan_json_lists_groups() {
        let factory = DescriptorFactory::by_key("user");
        let plan = plan_for(&[factory.buckets(2), factory.layout(4, 3)]).unwrap();
        let out = render(&plan, &inputs(), None, &OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        let source = &json["groups"][1]["sources"][1];
        assert_eq!(json["targetBuckets"], 2);
        assert_eq!(
            source["buckets"],
            serde_json::json!({"first": 1, "stride": 2, "count": 2})
        );
        assert_eq!(source["numShards"], 3);
    }

    #[test]
    fn test_plan_text_names_buckets() {
        let factory = DescriptorFactory::by_key("user");
        let plan = plan_for(&[factory.buckets(2), factory.buckets(8)]).unwrap();
        let out = render(&plan, &inputs(), None, &OutputFormat::Text).unwrap();
        assert!(out.contains("b: buckets 1,3,5,7 x 1 shard(s)"));
    }

    #[test]
    fn test_limit_bounds_listed_groups() {
        let factory = DescriptorFactory::by_key("user");
        let plan = plan_for(&[factory.buckets(1 << 20), factory.buckets(1 << 30)]).unwrap();
        let out = render(&plan, &inputs(), Some(3), &OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["targetBuckets"], 1 << 20);
        assert_eq!(json["groups"].as_array().unwrap().len(), 3);
        assert_eq!(json["groups"][2]["targetBucket"], 2);
    }

    #[test]
    fn test_incompatible_inputs_have_no_plan() {
        let a = DescriptorFactory::by_key("user").buckets(2);
        let b = DescriptorFactory::by_key("age").buckets(2);
        assert!(plan_for(&[a, b]).is_err());
    }
}
