//! Merge planning across datasets with different bucket counts.
//!
//! For compatible sources the merge runs at the smallest bucket count among them.
//! Target bucket `t` of a source with `n` buckets is the union of its buckets
//! `{ j : j mod target == t }`, read across every shard.

use serde::Serialize;

use crate::bucket::{BucketGroup, rebucket_group};
use crate::metadata::BucketMetadata;
use crate::observability::merge_span;

/// What one source contributes to one target bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceGroup {
    /// Source buckets to read.
    pub buckets: BucketGroup,
    /// Shards per bucket; each listed bucket is read across all of them.
    pub num_shards: u32,
}

/// Everything to read for one target bucket, one entry per source in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeGroup {
    /// Target bucket index.
    pub target_bucket: u32,
    /// Per-source inputs.
    pub sources: Vec<SourceGroup>,
}

/// A bucket-by-bucket merge of pairwise compatible sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePlan {
    target_buckets: u32,
    source_buckets: Vec<u32>,
    source_shards: Vec<u32>,
}

impl MergePlan {
    /// Plans a merge of `sources`.
    ///
    /// Returns `None` when `sources` is empty or any pair is incompatible.
    #[must_use]
    pub fn plan(sources: &[&BucketMetadata]) -> Option<Self> {
        let span = merge_span("plan", sources.len());
        let _guard = span.enter();

        let (first, rest) = sources.split_first()?;
        let incompatible = rest.iter().find(|m| !first.is_partition_compatible(m));
        if let Some(other) = incompatible {
            tracing::debug!(
                first = %first.key_field(),
                other = %other.key_field(),
                "cannot plan merge of incompatible sources"
            );
            return None;
        }

        let target_buckets = sources.iter().map(|m| m.num_buckets()).min()?;
        tracing::debug!(target_buckets, "planned merge");
        Some(Self {
            target_buckets,
            source_buckets: sources.iter().map(|m| m.num_buckets()).collect(),
            source_shards: sources.iter().map(|m| m.num_shards()).collect(),
        })
    }

    /// Returns the bucket count the merge runs at.
    #[must_use]
    pub const fn target_buckets(&self) -> u32 {
        self.target_buckets
    }

    /// Returns the number of source buckets read per target bucket, per source.
    #[must_use]
    pub fn fan_in(&self) -> Vec<u32> {
        self.source_buckets
            .iter()
            .map(|n| n / self.target_buckets)
            .collect()
    }

    /// Returns what every source contributes to `target_bucket`, or `None` if it
    /// is out of range.
    #[must_use]
    pub fn bucket_group(&self, target_bucket: u32) -> Option<MergeGroup> {
        if target_bucket >= self.target_buckets {
            return None;
        }
        let sources = self
            .source_buckets
            .iter()
            .zip(&self.source_shards)
            .map(|(&num_buckets, &num_shards)| {
                rebucket_group(target_bucket, self.target_buckets, num_buckets)
                    .ok()
                    .map(|buckets| SourceGroup {
                        buckets,
                        num_shards,
                    })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(MergeGroup {
            target_bucket,
            sources,
        })
    }

    /// Iterates the groups for every target bucket in ascending order.
    ///
    /// Groups are built on demand, so planning a merge never allocates per bucket.
    pub fn groups(&self) -> impl Iterator<Item = MergeGroup> + '_ {
        let targets = 0..self.target_buckets;
        targets.filter_map(|t| self.bucket_group(t))
    }
}
