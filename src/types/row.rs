//! Rows and their keys.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::types::value::{AttributeValue, PrimaryKeyValue};

/// One named primary-key cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyColumn {
    pub name: String,
    pub value: PrimaryKeyValue,
}

impl PrimaryKeyColumn {
    pub fn new(name: impl Into<String>, value: impl Into<PrimaryKeyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered sequence of primary-key cells.
///
/// Column order is significant: it must match the table schema, and key
/// comparison is lexicographic per column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrimaryKey(pub Vec<PrimaryKeyColumn>);

impl PrimaryKey {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a cell, builder-style.
    pub fn column(mut self, name: impl Into<String>, value: impl Into<PrimaryKeyValue>) -> Self {
        self.0.push(PrimaryKeyColumn::new(name, value));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrimaryKeyColumn> {
        self.0.iter()
    }

    /// Looks a cell up by name.
    pub fn get(&self, name: &str) -> Option<&PrimaryKeyValue> {
        self.0.iter().find(|c| c.name == name).map(|c| &c.value)
    }

    /// Lexicographic comparison per column.
    ///
    /// Both keys must have the same number of columns; every column pair
    /// must be comparable (see [`PrimaryKeyValue::compare`]).
    pub fn compare(&self, other: &Self) -> Result<Ordering> {
        if self.0.len() != other.0.len() {
            return Err(Error::validation(format!(
                "cannot compare primary keys of {} and {} columns",
                self.0.len(),
                other.0.len()
            )));
        }
        for (l, r) in self.0.iter().zip(other.0.iter()) {
            match l.value.compare(&r.value)? {
                Ordering::Equal => continue,
                ord => return Ok(ord),
            }
        }
        Ok(Ordering::Equal)
    }

    /// Write-side validation: every cell must be a real value or the
    /// auto-increment placeholder.
    pub(crate) fn validate_for_write(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::validation("primary key must be non-empty"));
        }
        for col in &self.0 {
            if col.name.is_empty() {
                return Err(Error::validation("primary-key column name must be non-empty"));
            }
            if !col.value.is_real() && col.value != PrimaryKeyValue::AutoIncrement {
                return Err(Error::validation(format!(
                    "primary-key column {:?} must not be a {} value",
                    col.name,
                    col.value.kind()
                )));
            }
        }
        Ok(())
    }

    /// Read-side validation: every cell must be a real value.
    pub(crate) fn validate_for_point_read(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::validation("primary key must be non-empty"));
        }
        for col in &self.0 {
            if !col.value.is_real() {
                return Err(Error::validation(format!(
                    "primary-key column {:?} must not be a {} value",
                    col.name,
                    col.value.kind()
                )));
            }
        }
        Ok(())
    }

    /// Range-bound validation: real values and infinities are allowed.
    pub(crate) fn validate_as_range_bound(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::validation("primary key must be non-empty"));
        }
        for col in &self.0 {
            if !col.value.is_real() && !col.value.is_inf() {
                return Err(Error::validation(format!(
                    "range-bound column {:?} must not be a {} value",
                    col.name,
                    col.value.kind()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, col) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", col.name, col.value)?;
        }
        f.write_str("}")
    }
}

impl FromIterator<PrimaryKeyColumn> for PrimaryKey {
    fn from_iter<T: IntoIterator<Item = PrimaryKeyColumn>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One named attribute cell, optionally pinned to a version timestamp
/// (milliseconds since epoch).
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
    pub timestamp: Option<i64>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("attribute name must be non-empty"));
        }
        if !self.value.is_real() {
            return Err(Error::validation(format!(
                "attribute {:?} must not be a none value",
                self.name
            )));
        }
        if let Some(ts) = self.timestamp {
            if ts < 0 {
                return Err(Error::validation(format!(
                    "attribute {:?} timestamp must not be negative",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// A full row: key plus attributes, in the order the service returned them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub primary_key: PrimaryKey,
    pub attributes: Vec<Attribute>,
}

impl Row {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
