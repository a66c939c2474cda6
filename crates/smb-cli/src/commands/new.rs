//! New command - build a descriptor and print its canonical form.

use anyhow::Result;
use clap::Args;

use smb_core::{BucketMetadata, DEFAULT_FILENAME_PREFIX, HashType, KeyType};

use crate::{Config, OutputFormat};

/// Arguments for the new command.
#[derive(Debug, Args)]
pub struct NewArgs {
    /// Number of buckets (a power of two).
    #[arg(long)]
    pub buckets: u32,

    /// Number of shards per bucket.
    #[arg(long, default_value_t = 1)]
    pub shards: u32,

    /// Dotted path of the key field.
    #[arg(long)]
    pub key_field: String,

    /// Key type: string, int32, int64, or bytes.
    #[arg(long)]
    pub key_type: KeyType,

    /// Hash function.
    #[arg(long = "hash", default_value_t = HashType::Murmur3_32)]
    pub hash_type: HashType,

    /// Filename prefix tag.
    #[arg(long = "prefix", default_value = DEFAULT_FILENAME_PREFIX)]
    pub filename_prefix: String,

    /// Pin a descriptor format version instead of the current one.
    #[arg(long)]
    pub format_version: Option<u32>,
}

/// Execute the new command.
///
/// # Errors
///
/// Returns an error if the arguments do not form a valid descriptor.
pub fn execute(args: &NewArgs, config: &Config) -> Result<()> {
    let metadata = build(args)?;
    let text = metadata.to_canonical_string()?;
    match config.format {
        OutputFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(&text)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text | OutputFormat::Table => println!("{text}"),
    }
    Ok(())
}

/// Builds the descriptor described by `args`.
///
/// # Errors
///
/// Returns an error if the arguments violate descriptor invariants.
pub fn build(args: &NewArgs) -> Result<BucketMetadata> {
    let mut builder = BucketMetadata::builder()
        .num_buckets(args.buckets)
        .num_shards(args.shards)
        .key_field(args.key_field.as_str())
        .key_type(args.key_type)
        .hash_type(args.hash_type)
        .filename_prefix(args.filename_prefix.as_str());
    if let Some(version) = args.format_version {
        builder = builder.version(version);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use clap::Parser;

    const COLOR_KEY: &str = "--key-field favorite_color --key-type string";

    fn parse(extra: &str) -> NewArgs {
        let command_line = ["smb", "new"].into_iter().chain(extra.split_whitespace());
        match Cli::parse_from(command_line).command {
            Commands::New(args) => args,
            other => panic!("expected new, got {other:?}"),
        }
    }

    #[test]
    fn test_builds_with_defaults() {
        let args = parse(&format!("--buckets 4 {COLOR_KEY}"));
        let expected = concat!(
            r#"{"filenamePrefix":"bucket","hashType":"MURMUR3_32","keyClass":"string","#,
            r#""keyField":"favorite_color","numBuckets":4,"numShards":1,"version":1}"#
        );
        let metadata = build(&args).unwrap();
        assert_eq!(metadata.to_canonical_string().unwrap(), expected);
    }

    #[test]
    fn test_accepts_every_option() {
        let layout = "--buckets 8 --shards 3";
        let key = "--key-field a.b --key-type INT64";
        let line = format!("{layout} {key} --hash murmur3_128 --format-version 0");
        let metadata = build(&parse(&line)).unwrap();
        assert_eq!(metadata.version(), 0);
        assert_eq!(metadata.hash_type(), HashType::Murmur3_128);
        assert_eq!(metadata.key_type(), KeyType::Int64);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let args = parse("--buckets 6 --key-field k --key-type string");
        assert!(build(&args).is_err());
        let float_key = "smb new --buckets 4 --key-field k --key-type float";
        assert!(Cli::try_parse_from(float_key.split_whitespace()).is_err());
    }
}
