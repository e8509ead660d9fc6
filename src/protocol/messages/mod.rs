//! Typed request and response pairs, one module per verb.
//!
//! Every request type implements [`OtsRequest`]: it validates itself,
//! encodes its protobuf body and decodes the matching response body. The
//! client stays generic over this trait and dispatches nothing else.

use std::fmt;

use bytes::Bytes;
use prost::Message;

use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::protocol::plainbuffer::writer;
use crate::types::{
    BloomFilterType, CapacityUnit, ColumnCondition, CompareOp, Condition, ConsumedCapacity,
    LogicalOp, PrimaryKeyColumnSchema, PrimaryKeyOption, PrimaryKeyType, ReservedThroughputDetails,
    ReturnType, RowExistence, TableMeta, TableOptions,
};

mod batch_get_row;
mod batch_write_row;
mod compute_split_points_by_size;
mod create_table;
mod delete_row;
mod delete_table;
mod describe_table;
mod get_range;
mod get_row;
mod list_table;
mod put_row;
mod update_row;
mod update_table;

pub use batch_get_row::{
    BatchGetRowRequest, BatchGetRowResponse, GetRowEntry, RowInBatchGetResult,
    TableInBatchGetRowRequest, TableInBatchGetRowResult,
};
pub use batch_write_row::{
    BatchWriteRowRequest, BatchWriteRowResponse, RowInBatchWriteResult, WriteEntry,
};
pub use compute_split_points_by_size::{
    ComputeSplitPointsBySizeRequest, ComputeSplitPointsBySizeResponse, SplitLocation,
};
pub use create_table::{CreateTableRequest, CreateTableResponse};
pub use delete_row::{DeleteRowRequest, DeleteRowResponse};
pub use delete_table::{DeleteTableRequest, DeleteTableResponse};
pub use describe_table::{DescribeTableRequest, DescribeTableResponse};
pub use get_range::{Direction, GetRangeRequest, GetRangeResponse};
pub use get_row::{GetRowRequest, GetRowResponse};
pub use list_table::{ListTableRequest, ListTableResponse};
pub use put_row::{PutRowRequest, PutRowResponse};
pub use update_row::{UpdateRowRequest, UpdateRowResponse};
pub use update_table::{UpdateTableRequest, UpdateTableResponse};

/// Per-exchange identifiers a response carries besides its body.
#[derive(Debug, Clone, Default)]
pub struct ResponseMeta {
    /// `x-ots-requestid` issued by the service.
    pub request_id: String,

    /// Tracker id of the attempt that produced this response.
    pub trace_id: String,
}

/// Version bounds of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// Versions within `[start_ms, end_ms)`.
    Range { start_ms: i64, end_ms: i64 },
    /// Exactly the version written at this timestamp.
    Specific { at_ms: i64 },
}

impl TimeRange {
    pub(crate) fn to_pb(self) -> pb::TimeRange {
        match self {
            Self::Range { start_ms, end_ms } => pb::TimeRange {
                start_time: Some(start_ms),
                end_time: Some(end_ms),
                specific_time: None,
            },
            Self::Specific { at_ms } => pb::TimeRange {
                start_time: None,
                end_time: None,
                specific_time: Some(at_ms),
            },
        }
    }
}

/// A typed request of one verb.
pub trait OtsRequest: fmt::Debug + Send + Sync {
    type Response: Send + 'static;

    const ACTION: Action;

    /// Client-side validation, before anything hits the wire.
    fn validate(&self) -> Result<()>;

    /// Serializes the protobuf body.
    fn encode_body(&self) -> Result<Bytes>;

    /// Parses the response body of a 2xx exchange.
    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response>;
}

pub(crate) fn decode_pb<M: Message + Default>(body: &[u8], what: &str) -> Result<M> {
    M::decode(body).map_err(|e| {
        Error::corrupted_response(format!("undecodable {what} body: {e}"), file!(), line!())
    })
}

pub(crate) fn condition_to_pb(condition: &Condition) -> Result<pb::Condition> {
    let row_existence = match condition.row_existence {
        RowExistence::Ignore => pb::RowExistenceExpectation::Ignore,
        RowExistence::ExpectExist => pb::RowExistenceExpectation::ExpectExist,
        RowExistence::ExpectNotExist => pb::RowExistenceExpectation::ExpectNotExist,
    };
    let column_condition = condition
        .column_condition
        .as_ref()
        .map(filter_to_pb_bytes)
        .transpose()?;
    Ok(pb::Condition {
        row_existence: row_existence as i32,
        column_condition,
    })
}

/// Lowers a filter tree to a serialized `pb::Filter`.
pub(crate) fn filter_to_pb_bytes(filter: &ColumnCondition) -> Result<Vec<u8>> {
    Ok(filter_to_pb(filter)?.encode_to_vec())
}

fn filter_to_pb(filter: &ColumnCondition) -> Result<pb::Filter> {
    let (r#type, inner) = match filter {
        ColumnCondition::Single(single) => {
            let comparator = match single.op {
                CompareOp::Equal => pb::ComparatorType::CtEqual,
                CompareOp::NotEqual => pb::ComparatorType::CtNotEqual,
                CompareOp::GreaterThan => pb::ComparatorType::CtGreaterThan,
                CompareOp::GreaterEqual => pb::ComparatorType::CtGreaterEqual,
                CompareOp::LessThan => pb::ComparatorType::CtLessThan,
                CompareOp::LessEqual => pb::ComparatorType::CtLessEqual,
            };
            let single = pb::SingleColumnValueFilter {
                comparator: comparator as i32,
                column_name: single.name.clone(),
                column_value: writer::filter_value(&single.value)?,
                filter_if_missing: !single.pass_if_missing,
                latest_version_only: single.latest_version_only,
            };
            (pb::FilterType::FtSingleColumnValue, single.encode_to_vec())
        }
        ColumnCondition::Composite(composite) => {
            let combinator = match composite.op {
                LogicalOp::Not => pb::LogicalOperator::LoNot,
                LogicalOp::And => pb::LogicalOperator::LoAnd,
                LogicalOp::Or => pb::LogicalOperator::LoOr,
            };
            let composite = pb::CompositeColumnValueFilter {
                combinator: combinator as i32,
                sub_filters: composite
                    .children
                    .iter()
                    .map(filter_to_pb)
                    .collect::<Result<Vec<_>>>()?,
            };
            (
                pb::FilterType::FtCompositeColumnValue,
                composite.encode_to_vec(),
            )
        }
    };
    Ok(pb::Filter {
        r#type: r#type as i32,
        filter: inner,
    })
}

pub(crate) fn return_content_to_pb(return_type: ReturnType) -> Option<pb::ReturnContent> {
    match return_type {
        ReturnType::None => None,
        ReturnType::PrimaryKey => Some(pb::ReturnContent {
            return_type: Some(pb::ReturnType::RtPk as i32),
        }),
    }
}

pub(crate) fn capacity_from_pb(pb: pb::CapacityUnit) -> CapacityUnit {
    CapacityUnit {
        read: pb.read,
        write: pb.write,
    }
}

pub(crate) fn consumed_from_pb(pb: pb::ConsumedCapacity) -> ConsumedCapacity {
    ConsumedCapacity {
        capacity_unit: capacity_from_pb(pb.capacity_unit),
    }
}

pub(crate) fn throughput_details_from_pb(
    pb: pb::ReservedThroughputDetails,
) -> ReservedThroughputDetails {
    ReservedThroughputDetails {
        capacity_unit: capacity_from_pb(pb.capacity_unit),
        last_increase_time: pb.last_increase_time,
        last_decrease_time: pb.last_decrease_time,
    }
}

pub(crate) fn table_meta_to_pb(meta: &TableMeta) -> pb::TableMeta {
    pb::TableMeta {
        table_name: meta.table_name.clone(),
        primary_key: meta
            .schema
            .iter()
            .map(|col| pb::PrimaryKeySchema {
                name: col.name.clone(),
                r#type: match col.r#type {
                    PrimaryKeyType::Integer => pb::PrimaryKeyType::Integer,
                    PrimaryKeyType::String => pb::PrimaryKeyType::String,
                    PrimaryKeyType::Binary => pb::PrimaryKeyType::Binary,
                } as i32,
                option: col.option.map(|option| match option {
                    PrimaryKeyOption::AutoIncrement => pb::PrimaryKeyOption::AutoIncrement as i32,
                }),
            })
            .collect(),
    }
}

pub(crate) fn table_meta_from_pb(pb: pb::TableMeta) -> Result<TableMeta> {
    let schema = pb
        .primary_key
        .into_iter()
        .map(|col| {
            let r#type = match pb::PrimaryKeyType::try_from(col.r#type) {
                Ok(pb::PrimaryKeyType::Integer) => PrimaryKeyType::Integer,
                Ok(pb::PrimaryKeyType::String) => PrimaryKeyType::String,
                Ok(pb::PrimaryKeyType::Binary) => PrimaryKeyType::Binary,
                Err(_) => {
                    return Err(Error::corrupted_response(
                        format!("unknown primary-key type {}", col.r#type),
                        file!(),
                        line!(),
                    ))
                }
            };
            let option = match col.option {
                None => None,
                Some(option) => match pb::PrimaryKeyOption::try_from(option) {
                    Ok(pb::PrimaryKeyOption::AutoIncrement) => {
                        Some(PrimaryKeyOption::AutoIncrement)
                    }
                    Err(_) => {
                        return Err(Error::corrupted_response(
                            format!("unknown primary-key option {option}"),
                            file!(),
                            line!(),
                        ))
                    }
                },
            };
            Ok(PrimaryKeyColumnSchema {
                name: col.name,
                r#type,
                option,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TableMeta {
        table_name: pb.table_name,
        schema,
    })
}

pub(crate) fn table_options_to_pb(options: &TableOptions) -> pb::TableOptions {
    pb::TableOptions {
        time_to_live: options.time_to_live,
        max_versions: options.max_versions,
        bloom_filter_type: options.bloom_filter_type.map(|b| match b {
            BloomFilterType::None => pb::BloomFilterType::None,
            BloomFilterType::Cell => pb::BloomFilterType::Cell,
            BloomFilterType::Row => pb::BloomFilterType::Row,
        } as i32),
        block_size: options.block_size,
        deviation_cell_version_in_sec: options.max_time_deviation,
    }
}

pub(crate) fn table_options_from_pb(pb: pb::TableOptions) -> TableOptions {
    TableOptions {
        time_to_live: pb.time_to_live,
        max_versions: pb.max_versions,
        bloom_filter_type: pb.bloom_filter_type.and_then(|b| {
            match pb::BloomFilterType::try_from(b) {
                Ok(pb::BloomFilterType::None) => Some(BloomFilterType::None),
                Ok(pb::BloomFilterType::Cell) => Some(BloomFilterType::Cell),
                Ok(pb::BloomFilterType::Row) => Some(BloomFilterType::Row),
                Err(_) => None,
            }
        }),
        block_size: pb.block_size,
        max_time_deviation: pb.deviation_cell_version_in_sec,
    }
}

/// Converts a per-row error of a batch response.
pub(crate) fn row_error_from_pb(error: pb::Error, http_status: i32) -> Error {
    Error::new(http_status, error.code, error.message.unwrap_or_default())
}

/// Parses the error body of a non-2xx response, if it decodes at all.
pub(crate) fn decode_error_body(body: &[u8]) -> Option<(String, String)> {
    pb::Error::decode(body)
        .ok()
        .map(|e| (e.code, e.message.unwrap_or_default()))
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::ResponseMeta;

    pub(crate) fn meta() -> ResponseMeta {
        ResponseMeta {
            request_id: "req-0001".to_string(),
            trace_id: "trace-0001".to_string(),
        }
    }
}
