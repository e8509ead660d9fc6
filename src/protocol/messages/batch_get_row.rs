//! `BatchGetRow` request and response.
//!
//! Rows are requested per table; results come back per table in request
//! order. Each entry may carry opaque user data which round-trips onto
//! the matching result untouched.

use bytes::Bytes;
use prost::Message;

use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::protocol::plainbuffer::{reader, writer};
use crate::types::{ColumnCondition, ConsumedCapacity, PrimaryKey, Row};

use super::{
    consumed_from_pb, decode_pb, filter_to_pb_bytes, row_error_from_pb, OtsRequest, ResponseMeta,
    TimeRange,
};

/// One requested row.
#[derive(Debug, Clone)]
pub struct GetRowEntry {
    pub primary_key: PrimaryKey,
    /// Opaque payload copied verbatim onto the matching result.
    pub user_data: Option<Bytes>,
}

impl GetRowEntry {
    pub fn new(primary_key: PrimaryKey) -> Self {
        Self {
            primary_key,
            user_data: None,
        }
    }

    pub fn with_user_data(mut self, user_data: impl Into<Bytes>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct TableInBatchGetRowRequest {
    pub table_name: String,
    pub entries: Vec<GetRowEntry>,
    pub columns_to_get: Vec<String>,
    pub time_range: Option<TimeRange>,
    pub max_versions: Option<i32>,
    pub filter: Option<ColumnCondition>,
}

impl TableInBatchGetRowRequest {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            entries: Vec::new(),
            columns_to_get: Vec::new(),
            time_range: None,
            max_versions: None,
            filter: None,
        }
    }

    pub fn entry(mut self, entry: GetRowEntry) -> Self {
        self.entries.push(entry);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchGetRowRequest {
    pub tables: Vec<TableInBatchGetRowRequest>,
}

impl BatchGetRowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: TableInBatchGetRowRequest) -> Self {
        self.tables.push(table);
        self
    }
}

/// Result of one requested row.
#[derive(Debug, Clone)]
pub struct RowInBatchGetResult {
    pub user_data: Option<Bytes>,
    pub consumed: Option<ConsumedCapacity>,
    /// `Ok(None)` is a clean miss; `Err` is a per-row failure.
    pub result: Result<Option<Row>, Error>,
}

#[derive(Debug, Clone)]
pub struct TableInBatchGetRowResult {
    pub table_name: String,
    pub rows: Vec<RowInBatchGetResult>,
}

#[derive(Debug, Clone)]
pub struct BatchGetRowResponse {
    pub request_id: String,
    pub trace_id: String,
    pub tables: Vec<TableInBatchGetRowResult>,
}

impl OtsRequest for BatchGetRowRequest {
    type Response = BatchGetRowResponse;

    const ACTION: Action = Action::BatchGetRow;

    fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(Error::validation("a batch get must name at least one table"));
        }
        for (index, table) in self.tables.iter().enumerate() {
            if table.table_name.is_empty() {
                return Err(Error::validation("table name must be non-empty"));
            }
            if self.tables[..index]
                .iter()
                .any(|earlier| earlier.table_name == table.table_name)
            {
                return Err(Error::validation(format!(
                    "table {:?} appears twice in the batch",
                    table.table_name
                )));
            }
            if table.entries.is_empty() {
                return Err(Error::validation(format!(
                    "batch get on table {:?} requests no rows",
                    table.table_name
                )));
            }
            for entry in &table.entries {
                entry.primary_key.validate_for_point_read()?;
            }
            if let Some(filter) = &table.filter {
                filter.validate()?;
            }
        }
        Ok(())
    }

    fn encode_body(&self) -> Result<Bytes> {
        let tables = self
            .tables
            .iter()
            .map(|table| {
                Ok(pb::TableInBatchGetRowRequest {
                    table_name: table.table_name.clone(),
                    primary_key: table
                        .entries
                        .iter()
                        .map(|entry| Ok(writer::primary_key(&entry.primary_key)?.to_vec()))
                        .collect::<Result<Vec<_>>>()?,
                    columns_to_get: table.columns_to_get.clone(),
                    time_range: table.time_range.map(TimeRange::to_pb),
                    max_versions: table.max_versions,
                    filter: table.filter.as_ref().map(filter_to_pb_bytes).transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(pb::BatchGetRowRequest { tables }.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::BatchGetRowResponse = decode_pb(body, "BatchGetRow")?;
        if body.tables.len() != self.tables.len() {
            return Err(Error::corrupted_response(
                format!(
                    "asked {} tables, response talks about {}",
                    self.tables.len(),
                    body.tables.len()
                ),
                file!(),
                line!(),
            ));
        }

        let mut tables = Vec::with_capacity(body.tables.len());
        for table in body.tables {
            let requested = self
                .tables
                .iter()
                .find(|t| t.table_name == table.table_name)
                .ok_or_else(|| {
                    Error::corrupted_response(
                        format!("response talks about unrequested table {:?}", table.table_name),
                        file!(),
                        line!(),
                    )
                })?;
            if table.rows.len() != requested.entries.len() {
                return Err(Error::corrupted_response(
                    format!(
                        "asked {} rows of table {:?}, response carries {}",
                        requested.entries.len(),
                        table.table_name,
                        table.rows.len()
                    ),
                    file!(),
                    line!(),
                ));
            }

            let rows = table
                .rows
                .into_iter()
                .zip(requested.entries.iter())
                .map(|(row, entry)| {
                    let result = if row.is_ok {
                        match row.row {
                            Some(blob) if !blob.is_empty() => {
                                reader::read_row(&blob).map(Some)
                            }
                            _ => Ok(None),
                        }
                    } else {
                        let error = row.error.unwrap_or(pb::Error {
                            code: "OTSUnknownError".to_string(),
                            message: None,
                        });
                        Err(row_error_from_pb(error, 0))
                    };
                    RowInBatchGetResult {
                        user_data: entry.user_data.clone(),
                        consumed: row.consumed.map(consumed_from_pb),
                        result,
                    }
                })
                .collect();
            tables.push(TableInBatchGetRowResult {
                table_name: table.table_name,
                rows,
            });
        }

        Ok(BatchGetRowResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            tables,
        })
    }
}
