//! Write conditions and column filters.

use crate::error::{Error, Result};
use crate::types::value::AttributeValue;

/// Expectation on row existence before a write applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowExistence {
    #[default]
    Ignore,
    ExpectExist,
    ExpectNotExist,
}

/// Relation of a single-column filter leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
}

/// Combinator of a composite filter node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    Not,
    And,
    Or,
}

/// Leaf of a filter tree: compares one column against a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleColumnCondition {
    pub name: String,
    pub op: CompareOp,
    pub value: AttributeValue,
    /// Whether a row lacking the column passes the filter.
    pub pass_if_missing: bool,
    /// Whether only the latest version of the column is inspected.
    pub latest_version_only: bool,
}

impl SingleColumnCondition {
    pub fn new(name: impl Into<String>, op: CompareOp, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            op,
            value: value.into(),
            pass_if_missing: true,
            latest_version_only: true,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("filter column name must be non-empty"));
        }
        if !self.value.is_real() {
            return Err(Error::validation(format!(
                "filter on column {:?} must compare against a real value",
                self.name
            )));
        }
        Ok(())
    }
}

/// Internal node of a filter tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeColumnCondition {
    pub op: LogicalOp,
    pub children: Vec<ColumnCondition>,
}

impl CompositeColumnCondition {
    pub fn new(op: LogicalOp) -> Self {
        Self {
            op,
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: impl Into<ColumnCondition>) -> Self {
        self.children.push(child.into());
        self
    }

    fn validate(&self) -> Result<()> {
        match self.op {
            LogicalOp::Not => {
                if self.children.len() != 1 {
                    return Err(Error::validation(
                        "a NOT filter must have exactly one child",
                    ));
                }
            }
            LogicalOp::And | LogicalOp::Or => {
                if self.children.len() < 2 {
                    return Err(Error::validation(
                        "an AND/OR filter must have at least two children",
                    ));
                }
            }
        }
        for child in &self.children {
            child.validate()?;
        }
        Ok(())
    }
}

/// A column filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnCondition {
    Single(SingleColumnCondition),
    Composite(CompositeColumnCondition),
}

impl ColumnCondition {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Single(c) => c.validate(),
            Self::Composite(c) => c.validate(),
        }
    }
}

impl From<SingleColumnCondition> for ColumnCondition {
    fn from(c: SingleColumnCondition) -> Self {
        Self::Single(c)
    }
}

impl From<CompositeColumnCondition> for ColumnCondition {
    fn from(c: CompositeColumnCondition) -> Self {
        Self::Composite(c)
    }
}

/// Full write condition: row existence plus an optional column filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    pub row_existence: RowExistence,
    pub column_condition: Option<ColumnCondition>,
}

impl Condition {
    pub fn ignore() -> Self {
        Self::default()
    }

    pub fn expect_exist() -> Self {
        Self {
            row_existence: RowExistence::ExpectExist,
            column_condition: None,
        }
    }

    pub fn expect_not_exist() -> Self {
        Self {
            row_existence: RowExistence::ExpectNotExist,
            column_condition: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(filter) = &self.column_condition {
            filter.validate()?;
        }
        Ok(())
    }
}
