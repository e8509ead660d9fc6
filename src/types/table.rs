//! Table schema and options.

use crate::error::{Error, Result};

/// Type of a primary-key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyType {
    Integer,
    String,
    Binary,
}

/// Per-column option of a primary-key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyOption {
    AutoIncrement,
}

/// Schema of one primary-key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyColumnSchema {
    pub name: String,
    pub r#type: PrimaryKeyType,
    pub option: Option<PrimaryKeyOption>,
}

impl PrimaryKeyColumnSchema {
    pub fn new(name: impl Into<String>, r#type: PrimaryKeyType) -> Self {
        Self {
            name: name.into(),
            r#type,
            option: None,
        }
    }

    pub fn auto_increment(mut self) -> Self {
        self.option = Some(PrimaryKeyOption::AutoIncrement);
        self
    }
}

/// Table name and primary-key schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableMeta {
    pub table_name: String,
    pub schema: Vec<PrimaryKeyColumnSchema>,
}

impl TableMeta {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema: Vec::new(),
        }
    }

    pub fn add_column(mut self, schema: PrimaryKeyColumnSchema) -> Self {
        self.schema.push(schema);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        if self.schema.is_empty() {
            return Err(Error::validation("table schema must be non-empty"));
        }
        for col in &self.schema {
            if col.name.is_empty() {
                return Err(Error::validation("primary-key column name must be non-empty"));
            }
            // auto-increment keys are generated integers
            if col.option == Some(PrimaryKeyOption::AutoIncrement)
                && col.r#type != PrimaryKeyType::Integer
            {
                return Err(Error::validation(format!(
                    "auto-increment applies only to integer primary-key columns, not to {:?}",
                    col.name
                )));
            }
        }
        Ok(())
    }
}

/// Server-side bloom filter granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloomFilterType {
    None,
    Cell,
    Row,
}

/// Read/write throughput in capacity units. `None` leaves a side untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapacityUnit {
    pub read: Option<i32>,
    pub write: Option<i32>,
}

impl CapacityUnit {
    pub fn new(read: i32, write: i32) -> Self {
        Self {
            read: Some(read),
            write: Some(write),
        }
    }
}

/// Throughput reserved for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReservedThroughput {
    pub capacity_unit: CapacityUnit,
}

impl ReservedThroughput {
    pub fn new(read: i32, write: i32) -> Self {
        Self {
            capacity_unit: CapacityUnit::new(read, write),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(read) = self.capacity_unit.read {
            if read < 0 {
                return Err(Error::validation("reserved read capacity must not be negative"));
            }
        }
        if let Some(write) = self.capacity_unit.write {
            if write < 0 {
                return Err(Error::validation(
                    "reserved write capacity must not be negative",
                ));
            }
        }
        Ok(())
    }
}

/// Reserved throughput as the service reports it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReservedThroughputDetails {
    pub capacity_unit: CapacityUnit,
    /// Seconds since epoch of the last increase.
    pub last_increase_time: Option<i64>,
    /// Seconds since epoch of the last decrease.
    pub last_decrease_time: Option<i64>,
}

/// Capacity the service consumed answering one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsumedCapacity {
    pub capacity_unit: CapacityUnit,
}

/// Tunable table options. Unset fields keep their server-side defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableOptions {
    /// Time-to-live in whole seconds; `-1` disables expiry.
    pub time_to_live: Option<i32>,
    pub max_versions: Option<i32>,
    pub bloom_filter_type: Option<BloomFilterType>,
    pub block_size: Option<i32>,
    /// Max tolerated deviation between cell timestamps and the server
    /// clock, in whole seconds.
    pub max_time_deviation: Option<i64>,
}

impl TableOptions {
    pub fn validate(&self) -> Result<()> {
        if let Some(ttl) = self.time_to_live {
            if ttl <= 0 && ttl != -1 {
                return Err(Error::validation(
                    "time-to-live must be a positive number of seconds, or -1 to disable",
                ));
            }
        }
        if let Some(versions) = self.max_versions {
            if versions <= 0 {
                return Err(Error::validation("max versions must be positive"));
            }
        }
        if let Some(block_size) = self.block_size {
            if block_size <= 0 {
                return Err(Error::validation("block size must be positive"));
            }
        }
        if let Some(deviation) = self.max_time_deviation {
            if deviation <= 0 {
                return Err(Error::validation(
                    "max time deviation must be a positive number of seconds",
                ));
            }
        }
        Ok(())
    }
}
