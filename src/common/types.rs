// Scalar Value Types
//
// Runtime scalar kinds, the SQL-nullable wrapper and the value type that
// shard partial rows are built from.

use std::cmp::Ordering;
use std::fmt;
use serde::{Deserialize, Serialize};

/// Runtime kind of a scalar value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarKind {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Text,
    Boolean,
}

impl ScalarKind {
    /// Signed or unsigned integer of any width
    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_signed(self) -> bool {
        matches!(self, ScalarKind::Int8 | ScalarKind::Int16 | ScalarKind::Int32 | ScalarKind::Int64)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, ScalarKind::UInt8 | ScalarKind::UInt16 | ScalarKind::UInt32 | ScalarKind::UInt64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarKind::Float32 | ScalarKind::Float64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Int8 => "INT8",
            ScalarKind::Int16 => "INT16",
            ScalarKind::Int32 => "INT32",
            ScalarKind::Int64 => "INT64",
            ScalarKind::UInt8 => "UINT8",
            ScalarKind::UInt16 => "UINT16",
            ScalarKind::UInt32 => "UINT32",
            ScalarKind::UInt64 => "UINT64",
            ScalarKind::Float32 => "FLOAT32",
            ScalarKind::Float64 => "FLOAT64",
            ScalarKind::Text => "TEXT",
            ScalarKind::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A non-null scalar value as scanned from a shard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Boolean(bool),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Int8(_) => ScalarKind::Int8,
            Scalar::Int16(_) => ScalarKind::Int16,
            Scalar::Int32(_) => ScalarKind::Int32,
            Scalar::Int64(_) => ScalarKind::Int64,
            Scalar::UInt8(_) => ScalarKind::UInt8,
            Scalar::UInt16(_) => ScalarKind::UInt16,
            Scalar::UInt32(_) => ScalarKind::UInt32,
            Scalar::UInt64(_) => ScalarKind::UInt64,
            Scalar::Float32(_) => ScalarKind::Float32,
            Scalar::Float64(_) => ScalarKind::Float64,
            Scalar::Text(_) => ScalarKind::Text,
            Scalar::Boolean(_) => ScalarKind::Boolean,
        }
    }

    /// Compare two scalars of the same kind.
    ///
    /// Returns `None` when the kinds differ: values of different kinds have
    /// no defined order. Floats compare numerically, so `0.0` equals `-0.0`;
    /// NaN falls back to the IEEE total order to stay usable in ordered maps.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Int8(a), Scalar::Int8(b)) => Some(a.cmp(b)),
            (Scalar::Int16(a), Scalar::Int16(b)) => Some(a.cmp(b)),
            (Scalar::Int32(a), Scalar::Int32(b)) => Some(a.cmp(b)),
            (Scalar::Int64(a), Scalar::Int64(b)) => Some(a.cmp(b)),
            (Scalar::UInt8(a), Scalar::UInt8(b)) => Some(a.cmp(b)),
            (Scalar::UInt16(a), Scalar::UInt16(b)) => Some(a.cmp(b)),
            (Scalar::UInt32(a), Scalar::UInt32(b)) => Some(a.cmp(b)),
            (Scalar::UInt64(a), Scalar::UInt64(b)) => Some(a.cmp(b)),
            (Scalar::Float32(a), Scalar::Float32(b)) => Some(a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))),
            (Scalar::Float64(a), Scalar::Float64(b)) => Some(a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))),
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            (Scalar::Boolean(a), Scalar::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Integer value widened to i128, `None` for non-integer kinds
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Scalar::Int8(v) => Some(i128::from(*v)),
            Scalar::Int16(v) => Some(i128::from(*v)),
            Scalar::Int32(v) => Some(i128::from(*v)),
            Scalar::Int64(v) => Some(i128::from(*v)),
            Scalar::UInt8(v) => Some(i128::from(*v)),
            Scalar::UInt16(v) => Some(i128::from(*v)),
            Scalar::UInt32(v) => Some(i128::from(*v)),
            Scalar::UInt64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    /// Numeric value as f64, `None` for text and booleans
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float32(v) => Some(f64::from(*v)),
            Scalar::Float64(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int8(v) => write!(f, "{}", v),
            Scalar::Int16(v) => write!(f, "{}", v),
            Scalar::Int32(v) => write!(f, "{}", v),
            Scalar::Int64(v) => write!(f, "{}", v),
            Scalar::UInt8(v) => write!(f, "{}", v),
            Scalar::UInt16(v) => write!(f, "{}", v),
            Scalar::UInt32(v) => write!(f, "{}", v),
            Scalar::UInt64(v) => write!(f, "{}", v),
            Scalar::Float32(v) => write!(f, "{}", v),
            Scalar::Float64(v) => write!(f, "{}", v),
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// SQL-nullable wrapper: a declared kind plus an optional value of that kind.
///
/// The constructors keep `value.kind() == kind` whenever a value is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNullable")]
pub struct Nullable {
    kind: ScalarKind,
    value: Option<Scalar>,
}

impl Nullable {
    /// A present (valid) value
    pub fn valid(value: Scalar) -> Self {
        Nullable { kind: value.kind(), value: Some(value) }
    }

    /// A typed NULL
    pub fn null(kind: ScalarKind) -> Self {
        Nullable { kind, value: None }
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Scalar> {
        self.value.as_ref()
    }
}

#[derive(Deserialize)]
struct RawNullable {
    kind: ScalarKind,
    value: Option<Scalar>,
}

impl TryFrom<RawNullable> for Nullable {
    type Error = String;

    fn try_from(raw: RawNullable) -> Result<Self, Self::Error> {
        match raw.value {
            Some(value) if value.kind() != raw.kind => Err(format!(
                "nullable declared as {} holds a {} value",
                raw.kind,
                value.kind()
            )),
            value => Ok(Nullable { kind: raw.kind, value }),
        }
    }
}

/// One value of a shard row: either a bare scalar or a nullable wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    Scalar(Scalar),
    Nullable(Nullable),
}

impl DataValue {
    /// Typed NULL of the given kind
    pub fn null(kind: ScalarKind) -> Self {
        DataValue::Nullable(Nullable::null(kind))
    }

    /// Valid value wrapped as nullable
    pub fn nullable(value: impl Into<Scalar>) -> Self {
        DataValue::Nullable(Nullable::valid(value.into()))
    }

    /// The underlying scalar, unwrapping valid nullables. `None` means NULL.
    pub fn non_null(&self) -> Option<&Scalar> {
        match self {
            DataValue::Scalar(s) => Some(s),
            DataValue::Nullable(n) => n.value(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.non_null().is_none()
    }

    /// Kind of the value; the declared kind for nullables
    pub fn kind(&self) -> ScalarKind {
        match self {
            DataValue::Scalar(s) => s.kind(),
            DataValue::Nullable(n) => n.kind(),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.non_null() {
            Some(s) => write!(f, "{}", s),
            None => write!(f, "NULL"),
        }
    }
}

impl From<Scalar> for DataValue {
    fn from(value: Scalar) -> Self {
        DataValue::Scalar(value)
    }
}

impl From<Nullable> for DataValue {
    fn from(value: Nullable) -> Self {
        DataValue::Nullable(value)
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }

            impl From<$ty> for DataValue {
                fn from(value: $ty) -> Self {
                    DataValue::Scalar(Scalar::$variant(value))
                }
            }
        )*
    };
}

scalar_from! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => Text,
    bool => Boolean,
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Scalar(Scalar::from(value))
    }
}
