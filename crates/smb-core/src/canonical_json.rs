//! Canonical JSON for descriptor files.
//!
//! A descriptor written by one implementation must be byte-identical when written
//! by another, so the on-disk form is a single strict encoding:
//!
//! - Object keys sorted lexicographically (UTF-8 byte order)
//! - No whitespace
//! - UTF-8 output
//! - Integers only (floats rejected)
//!
//! # Python Equivalent
//!
//! ```python
//! json.dumps(value, sort_keys=True, separators=(",", ":"), ensure_ascii=False, allow_nan=False)
//! ```

use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt::Write as _;

/// Errors that can occur during canonical JSON serialization.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalJsonError {
    /// The value could not be converted to a JSON tree.
    #[error("cannot convert to JSON: {0}")]
    Serde(#[from] serde_json::Error),

    /// A number that is not an integer was found.
    #[error("non-integer number {0} cannot be written canonically")]
    FloatNotAllowed(Number),

    /// Writing to the output buffer failed.
    #[error("formatting failed")]
    Fmt(#[from] std::fmt::Error),
}

/// Serializes `value` to its canonical JSON text.
///
/// # Errors
///
/// Returns [`CanonicalJsonError::Serde`] if `value` cannot be represented as JSON,
/// or [`CanonicalJsonError::FloatNotAllowed`] if it contains a non-integer number.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String, CanonicalJsonError> {
    let tree = serde_json::to_value(value)?;
    let mut out = String::new();
    emit(&tree, &mut out)?;
    Ok(out)
}

fn emit(node: &Value, out: &mut String) -> Result<(), CanonicalJsonError> {
    match node {
        Value::Null | Value::Bool(_) | Value::String(_) => {
            // serde_json's compact form is already canonical for scalars.
            out.push_str(&serde_json::to_string(node)?);
        }
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => write!(out, "{i}")?,
            (None, Some(u)) => write!(out, "{u}")?,
            (None, None) => return Err(CanonicalJsonError::FloatNotAllowed(n.clone())),
        },
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                emit(item, out)?;
            }
            out.push(']');
        }
        Value::Object(fields) => {
            let mut sorted: Vec<_> = fields.iter().collect();
            sorted.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push('{');
            for (i, (name, field)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(name)?);
                out.push(':');
                emit(field, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}
