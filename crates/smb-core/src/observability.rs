//! Logging setup and span helpers.
//!
//! Per-record paths (extraction, hashing, assignment) emit nothing. Descriptor
//! decoding, compatibility checks, and merge planning log at `debug`, and a
//! descriptor read under a legacy version logs at `warn`.

use std::fmt;
use std::str::FromStr;
use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{
    EnvFilter, fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::error::{Error, Result};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

impl LogFormat {
    /// Returns the format name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(Error::invalid_config(format!(
                "unknown log format '{other}'; expected json or pretty"
            ))),
        }
    }
}

/// Initializes the logging subsystem.
///
/// Safe to call multiple times; only the first call installs a subscriber.
/// `RUST_LOG` controls levels (default `info`).
///
/// ```rust
/// use smb_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    init_logging_with_default(format, "info");
}

/// Like [`init_logging`], with `default_filter` applied when `RUST_LOG` is unset.
pub fn init_logging_with_default(format: LogFormat, default_filter: &str) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for operations on one descriptor.
///
/// ```rust
/// use smb_core::observability::descriptor_span;
///
/// let span = descriptor_span("inspect", "user_id", 16);
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn descriptor_span(operation: &str, key_field: &str, num_buckets: u32) -> Span {
    tracing::info_span!(
        "descriptor",
        op = operation,
        key_field = key_field,
        num_buckets = num_buckets,
    )
}

/// Creates a span for operations across several descriptors.
#[must_use]
pub fn merge_span(operation: &str, sources: usize) -> Span {
    tracing::info_span!("merge", op = operation, sources = sources)
}
