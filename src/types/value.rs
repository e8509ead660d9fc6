//! Cell values.
//!
//! Primary-key cells and attribute cells draw from two overlapping but
//! distinct sets of variants. `InfMin`/`InfMax` never appear in a persisted
//! row; they only bound `GetRange` scans. `AutoIncrement` is a write-side
//! placeholder the service replaces with a generated integer.

use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;

use crate::error::{Error, Result};

/// Value of one primary-key cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrimaryKeyValue {
    /// Absent value. Comparing it is undefined.
    #[default]
    None,
    Integer(i64),
    String(String),
    Binary(Bytes),
    /// Lower bound of any range, smaller than every real value.
    InfMin,
    /// Upper bound of any range, greater than every real value.
    InfMax,
    /// Placeholder for a service-generated integer key.
    AutoIncrement,
}

impl PrimaryKeyValue {
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::Binary(data.into())
    }

    /// Whether the value may appear in a persisted row.
    pub fn is_real(&self) -> bool {
        matches!(
            self,
            Self::Integer(_) | Self::String(_) | Self::Binary(_)
        )
    }

    /// Whether the value is a range bound.
    pub fn is_inf(&self) -> bool {
        matches!(self, Self::InfMin | Self::InfMax)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            Self::InfMin => "-inf",
            Self::InfMax => "+inf",
            Self::AutoIncrement => "auto-increment",
        }
    }

    /// Compares two values the way the service orders keys.
    ///
    /// `InfMin` is below and `InfMax` above every real value. Comparisons
    /// involving `None` or `AutoIncrement`, or real values of different
    /// types, are undefined and error out.
    pub fn compare(&self, other: &Self) -> Result<Ordering> {
        use PrimaryKeyValue::*;

        match (self, other) {
            (None, _) | (_, None) | (AutoIncrement, _) | (_, AutoIncrement) => {
                Err(Error::validation(format!(
                    "comparing a {} value with a {} value is undefined",
                    self.kind(),
                    other.kind()
                )))
            }
            (InfMin, InfMin) => Ok(Ordering::Equal),
            (InfMin, _) => Ok(Ordering::Less),
            (_, InfMin) => Ok(Ordering::Greater),
            (InfMax, InfMax) => Ok(Ordering::Equal),
            (InfMax, _) => Ok(Ordering::Greater),
            (_, InfMax) => Ok(Ordering::Less),
            (Integer(l), Integer(r)) => Ok(l.cmp(r)),
            (String(l), String(r)) => Ok(l.cmp(r)),
            (Binary(l), Binary(r)) => Ok(l.cmp(r)),
            _ => Err(Error::validation(format!(
                "cannot compare a {} value with a {} value",
                self.kind(),
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for PrimaryKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Binary(v) => write!(f, "b{v:?}"),
            Self::InfMin => f.write_str("-inf"),
            Self::InfMax => f.write_str("+inf"),
            Self::AutoIncrement => f.write_str("auto-incr"),
        }
    }
}

impl From<i64> for PrimaryKeyValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for PrimaryKeyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PrimaryKeyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Value of one attribute cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttributeValue {
    /// Absent value. Never valid in a write.
    #[default]
    None,
    Integer(i64),
    String(String),
    Binary(Bytes),
    Boolean(bool),
    Double(f64),
}

impl AttributeValue {
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::Binary(data.into())
    }

    pub fn is_real(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            Self::Boolean(_) => "boolean",
            Self::Double(_) => "double",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Binary(v) => write!(f, "b{v:?}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}
