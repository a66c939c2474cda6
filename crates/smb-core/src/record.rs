//! Structured record capability used by key extraction.
//!
//! A record is a tree of map-like containers, lists, and scalars. Key extraction
//! only needs two questions answered at each node: "what child sits under this
//! name" and "what scalar is this". Each supported record family implements
//! [`StructuredRecord`] once:
//!
//! - [`serde_json::Value`]: generic map/list trees (JSON rows)
//! - `apache_avro::types::Value`: schema-typed records (feature `avro`)

/// A borrowed view of a record node as a scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarRef<'a> {
    /// Explicit null or absent union branch.
    Null,
    /// Boolean.
    Bool(bool),
    /// Any integer that fits in 64 bits.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(&'a str),
    /// Raw bytes.
    Bytes(&'a [u8]),
    /// A map, record, list, or any value no key type accepts.
    Other(&'static str),
}

impl ScalarRef<'_> {
    /// Short description used in type mismatch errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Other(kind) => kind,
        }
    }
}

/// A node in a structured record tree.
pub trait StructuredRecord {
    /// Returns the child stored under `name`.
    ///
    /// Returns `None` when this node is not a map-like container or has no such field.
    fn field(&self, name: &str) -> Option<&Self>;

    /// Returns this node viewed as a scalar.
    fn scalar(&self) -> ScalarRef<'_>;
}

impl StructuredRecord for serde_json::Value {
    fn field(&self, name: &str) -> Option<&Self> {
        self.as_object().and_then(|map| map.get(name))
    }

    fn scalar(&self) -> ScalarRef<'_> {
        use serde_json::Value;

        match self {
            Value::Null => ScalarRef::Null,
            Value::Bool(b) => ScalarRef::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => ScalarRef::Int(i),
                _ if n.is_u64() => ScalarRef::Other("uint64"),
                (None, Some(f)) => ScalarRef::Float(f),
                (None, None) => ScalarRef::Other("number"),
            },
            Value::String(s) => ScalarRef::Str(s),
            Value::Array(_) => ScalarRef::Other("list"),
            Value::Object(_) => ScalarRef::Other("map"),
        }
    }
}

#[cfg(feature = "avro")]
mod avro {
    use apache_avro::types::Value as AvroValue;

    use super::{ScalarRef, StructuredRecord};

    /// Unwraps nullable unions to the branch they hold.
    fn resolved(value: &AvroValue) -> &AvroValue {
        match value {
            AvroValue::Union(_, inner) => resolved(inner),
            other => other,
        }
    }

    impl StructuredRecord for AvroValue {
        fn field(&self, name: &str) -> Option<&Self> {
            match resolved(self) {
                AvroValue::Record(fields) => fields
                    .iter()
                    .find(|(field_name, _)| field_name == name)
                    .map(|(_, v)| v),
                AvroValue::Map(map) => map.get(name),
                _ => None,
            }
        }

        fn scalar(&self) -> ScalarRef<'_> {
            match resolved(self) {
                AvroValue::Null => ScalarRef::Null,
                AvroValue::Boolean(b) => ScalarRef::Bool(*b),
                AvroValue::Int(n) | AvroValue::Date(n) | AvroValue::TimeMillis(n) => {
                    ScalarRef::Int(i64::from(*n))
                }
                AvroValue::Long(n)
                | AvroValue::TimeMicros(n)
                | AvroValue::TimestampMillis(n)
                | AvroValue::TimestampMicros(n) => ScalarRef::Int(*n),
                AvroValue::Float(f) => ScalarRef::Float(f64::from(*f)),
                AvroValue::Double(f) => ScalarRef::Float(*f),
                AvroValue::String(s) | AvroValue::Enum(_, s) => ScalarRef::Str(s),
                AvroValue::Bytes(b) | AvroValue::Fixed(_, b) => ScalarRef::Bytes(b),
                AvroValue::Record(_) => ScalarRef::Other("record"),
                AvroValue::Map(_) => ScalarRef::Other("map"),
                AvroValue::Array(_) => ScalarRef::Other("list"),
                _ => ScalarRef::Other("logical"),
            }
        }
    }

}
