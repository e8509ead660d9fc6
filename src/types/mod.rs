//! The client-side data model: values, rows, schemas, conditions and
//! single-row changes.

mod change;
mod condition;
mod row;
mod table;
mod value;

pub use change::{ReturnType, RowChange, RowDeleteChange, RowPutChange, RowUpdateChange, Update};
pub use condition::{
    ColumnCondition, CompareOp, CompositeColumnCondition, Condition, LogicalOp, RowExistence,
    SingleColumnCondition,
};
pub use row::{Attribute, PrimaryKey, PrimaryKeyColumn, Row};
pub use table::{
    BloomFilterType, CapacityUnit, ConsumedCapacity, PrimaryKeyColumnSchema, PrimaryKeyOption,
    PrimaryKeyType, ReservedThroughput, ReservedThroughputDetails, TableMeta, TableOptions,
};
pub use value::{AttributeValue, PrimaryKeyValue};
