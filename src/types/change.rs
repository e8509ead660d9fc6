//! Single-row write changes.

use crate::error::{Error, Result};
use crate::types::condition::Condition;
use crate::types::row::{Attribute, PrimaryKey};

/// What a write response should carry back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnType {
    #[default]
    None,
    /// Return the stored primary key. This is how the caller learns the
    /// value a service-side auto-increment column settled on.
    PrimaryKey,
}

/// Replaces an entire row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPutChange {
    pub table_name: String,
    pub primary_key: PrimaryKey,
    pub attributes: Vec<Attribute>,
    pub condition: Condition,
    pub return_type: ReturnType,
}

impl RowPutChange {
    pub fn new(table_name: impl Into<String>, primary_key: PrimaryKey) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key,
            attributes: Vec::new(),
            condition: Condition::ignore(),
            return_type: ReturnType::None,
        }
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        self.primary_key.validate_for_write()?;
        for attr in &self.attributes {
            attr.validate()?;
        }
        self.condition.validate()
    }
}

/// One attribute-level operation inside an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Writes one cell, optionally at an explicit version timestamp.
    Put(Attribute),
    /// Deletes one version of one attribute.
    DeleteOneVersion { name: String, timestamp: i64 },
    /// Deletes every version of one attribute.
    DeleteAllVersions { name: String },
}

impl Update {
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::Put(attr) => &attr.name,
            Self::DeleteOneVersion { name, .. } => name,
            Self::DeleteAllVersions { name } => name,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Put(attr) => attr.validate(),
            Self::DeleteOneVersion { name, timestamp } => {
                if name.is_empty() {
                    return Err(Error::validation("attribute name must be non-empty"));
                }
                if *timestamp < 0 {
                    return Err(Error::validation(format!(
                        "attribute {name:?} timestamp must not be negative"
                    )));
                }
                Ok(())
            }
            Self::DeleteAllVersions { name } => {
                if name.is_empty() {
                    return Err(Error::validation("attribute name must be non-empty"));
                }
                Ok(())
            }
        }
    }
}

/// Patches some attributes of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdateChange {
    pub table_name: String,
    pub primary_key: PrimaryKey,
    pub updates: Vec<Update>,
    pub condition: Condition,
    pub return_type: ReturnType,
}

impl RowUpdateChange {
    pub fn new(table_name: impl Into<String>, primary_key: PrimaryKey) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key,
            updates: Vec::new(),
            condition: Condition::ignore(),
            return_type: ReturnType::None,
        }
    }

    pub fn put(mut self, attr: Attribute) -> Self {
        self.updates.push(Update::Put(attr));
        self
    }

    pub fn delete_one_version(mut self, name: impl Into<String>, timestamp: i64) -> Self {
        self.updates.push(Update::DeleteOneVersion {
            name: name.into(),
            timestamp,
        });
        self
    }

    pub fn delete_all_versions(mut self, name: impl Into<String>) -> Self {
        self.updates.push(Update::DeleteAllVersions { name: name.into() });
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        self.primary_key.validate_for_write()?;
        if self.updates.is_empty() {
            return Err(Error::validation("an update must touch at least one attribute"));
        }
        for update in &self.updates {
            update.validate()?;
        }
        self.condition.validate()
    }
}

/// Deletes a whole row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDeleteChange {
    pub table_name: String,
    pub primary_key: PrimaryKey,
    pub condition: Condition,
    pub return_type: ReturnType,
}

impl RowDeleteChange {
    pub fn new(table_name: impl Into<String>, primary_key: PrimaryKey) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key,
            condition: Condition::ignore(),
            return_type: ReturnType::None,
        }
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        self.primary_key.validate_for_write()?;
        self.condition.validate()
    }
}

/// Any single-row write.
#[derive(Debug, Clone, PartialEq)]
pub enum RowChange {
    Put(RowPutChange),
    Update(RowUpdateChange),
    Delete(RowDeleteChange),
}

impl RowChange {
    pub fn table_name(&self) -> &str {
        match self {
            Self::Put(c) => &c.table_name,
            Self::Update(c) => &c.table_name,
            Self::Delete(c) => &c.table_name,
        }
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        match self {
            Self::Put(c) => &c.primary_key,
            Self::Update(c) => &c.primary_key,
            Self::Delete(c) => &c.primary_key,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Put(c) => c.validate(),
            Self::Update(c) => c.validate(),
            Self::Delete(c) => c.validate(),
        }
    }
}

impl From<RowPutChange> for RowChange {
    fn from(c: RowPutChange) -> Self {
        Self::Put(c)
    }
}

impl From<RowUpdateChange> for RowChange {
    fn from(c: RowUpdateChange) -> Self {
        Self::Update(c)
    }
}

impl From<RowDeleteChange> for RowChange {
    fn from(c: RowDeleteChange) -> Self {
        Self::Delete(c)
    }
}
