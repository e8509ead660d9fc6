//! `BatchWriteRow` request and response.
//!
//! The request is a flat list of single-row changes; on the wire they are
//! grouped per table, and the response is flattened back into request
//! order, so result `i` always belongs to row `i` of the request. Opaque
//! per-row user data round-trips untouched.

use bytes::Bytes;
use prost::Message;

use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::protocol::plainbuffer::{reader, writer};
use crate::types::{Condition, ConsumedCapacity, ReturnType, Row, RowChange};

use super::{
    condition_to_pb, consumed_from_pb, decode_pb, return_content_to_pb, row_error_from_pb,
    OtsRequest, ResponseMeta,
};

/// One single-row write inside a batch.
#[derive(Debug, Clone)]
pub struct WriteEntry {
    pub change: RowChange,
    /// Opaque payload copied verbatim onto the matching result.
    pub user_data: Option<Bytes>,
}

impl WriteEntry {
    pub fn new(change: impl Into<RowChange>) -> Self {
        Self {
            change: change.into(),
            user_data: None,
        }
    }

    pub fn with_user_data(mut self, user_data: impl Into<Bytes>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchWriteRowRequest {
    pub rows: Vec<WriteEntry>,
}

impl BatchWriteRowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, entry: WriteEntry) -> Self {
        self.rows.push(entry);
        self
    }

    /// Flat indices grouped per table, preserving first-seen table order.
    fn grouped(&self) -> Vec<(&str, Vec<usize>)> {
        let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
        for (index, entry) in self.rows.iter().enumerate() {
            let table_name = entry.change.table_name();
            match groups.iter_mut().find(|(name, _)| *name == table_name) {
                Some((_, indices)) => indices.push(index),
                None => groups.push((table_name, vec![index])),
            }
        }
        groups
    }
}

/// Result of one row of the batch.
#[derive(Debug, Clone)]
pub struct RowInBatchWriteResult {
    pub user_data: Option<Bytes>,
    pub consumed: Option<ConsumedCapacity>,
    /// `Ok` carries the returned row when the change asked for one.
    pub result: Result<Option<Row>, Error>,
}

#[derive(Debug, Clone)]
pub struct BatchWriteRowResponse {
    pub request_id: String,
    pub trace_id: String,
    /// One result per request row, in request order.
    pub rows: Vec<RowInBatchWriteResult>,
}

fn change_to_pb_row(change: &RowChange) -> Result<pb::RowInBatchWriteRowRequest> {
    let (r#type, row_change, condition, return_type): (_, _, &Condition, ReturnType) = match change
    {
        RowChange::Put(c) => (
            pb::OperationType::Put,
            writer::put_change(c)?,
            &c.condition,
            c.return_type,
        ),
        RowChange::Update(c) => (
            pb::OperationType::Update,
            writer::update_change(c)?,
            &c.condition,
            c.return_type,
        ),
        RowChange::Delete(c) => (
            pb::OperationType::Delete,
            writer::delete_change(c)?,
            &c.condition,
            c.return_type,
        ),
    };
    Ok(pb::RowInBatchWriteRowRequest {
        r#type: r#type as i32,
        row_change: row_change.to_vec(),
        condition: condition_to_pb(condition)?,
        return_content: return_content_to_pb(return_type),
    })
}

impl OtsRequest for BatchWriteRowRequest {
    type Response = BatchWriteRowResponse;

    const ACTION: Action = Action::BatchWriteRow;

    fn validate(&self) -> Result<()> {
        if self.rows.is_empty() {
            return Err(Error::validation("a batch write must carry at least one row"));
        }
        for entry in &self.rows {
            entry.change.validate()?;
        }
        Ok(())
    }

    fn encode_body(&self) -> Result<Bytes> {
        let tables = self
            .grouped()
            .into_iter()
            .map(|(table_name, indices)| {
                Ok(pb::TableInBatchWriteRowRequest {
                    table_name: table_name.to_string(),
                    rows: indices
                        .into_iter()
                        .map(|index| change_to_pb_row(&self.rows[index].change))
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(pb::BatchWriteRowRequest { tables }.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::BatchWriteRowResponse = decode_pb(body, "BatchWriteRow")?;
        let groups = self.grouped();

        let mut slots: Vec<Option<RowInBatchWriteResult>> = vec![None; self.rows.len()];
        for table in body.tables {
            let (_, indices) = groups
                .iter()
                .find(|(name, _)| *name == table.table_name)
                .ok_or_else(|| {
                    Error::corrupted_response(
                        format!("response talks about unrequested table {:?}", table.table_name),
                        file!(),
                        line!(),
                    )
                })?;
            if table.rows.len() != indices.len() {
                return Err(Error::corrupted_response(
                    format!(
                        "sent {} rows of table {:?}, response carries {}",
                        indices.len(),
                        table.table_name,
                        table.rows.len()
                    ),
                    file!(),
                    line!(),
                ));
            }
            for (row, &index) in table.rows.into_iter().zip(indices.iter()) {
                let result = if row.is_ok {
                    match row.row {
                        Some(blob) if !blob.is_empty() => reader::read_row(&blob).map(Some),
                        _ => Ok(None),
                    }
                } else {
                    let error = row.error.unwrap_or(pb::Error {
                        code: "OTSUnknownError".to_string(),
                        message: None,
                    });
                    Err(row_error_from_pb(error, 0))
                };
                slots[index] = Some(RowInBatchWriteResult {
                    user_data: self.rows[index].user_data.clone(),
                    consumed: row.consumed.map(consumed_from_pb),
                    result,
                });
            }
        }

        let rows = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    Error::corrupted_response(
                        format!("response lacks a result for row {index}"),
                        file!(),
                        line!(),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BatchWriteRowResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::meta;
    use super::*;
    use crate::types::{PrimaryKey, RowDeleteChange, RowPutChange, RowUpdateChange};

    use assert_matches::assert_matches;

    fn pk(v: i64) -> PrimaryKey {
        PrimaryKey::new().column("pkey", v)
    }

    fn request() -> BatchWriteRowRequest {
        BatchWriteRowRequest::new()
            .row(WriteEntry::new(RowPutChange::new("a", pk(0))).with_user_data(&b"p"[..]))
            .row(WriteEntry::new(
                RowUpdateChange::new("b", pk(1)).delete_all_versions("x"),
            ))
            .row(WriteEntry::new(RowDeleteChange::new("a", pk(2))).with_user_data(&b"d"[..]))
    }

    fn ok_row() -> pb::RowInBatchWriteRowResponse {
        pb::RowInBatchWriteRowResponse {
            is_ok: true,
            error: None,
            consumed: None,
            row: None,
        }
    }

    #[test]
    fn rows_group_per_table_in_first_seen_order() {
        let body = request().encode_body().unwrap();
        let decoded = pb::BatchWriteRowRequest::decode(&body[..]).unwrap();
        assert_eq!(decoded.tables.len(), 2);
        assert_eq!(decoded.tables[0].table_name, "a");
        assert_eq!(decoded.tables[0].rows.len(), 2);
        assert_eq!(
            decoded.tables[0].rows[0].r#type,
            pb::OperationType::Put as i32
        );
        assert_eq!(
            decoded.tables[0].rows[1].r#type,
            pb::OperationType::Delete as i32
        );
        assert_eq!(decoded.tables[1].table_name, "b");
        assert_eq!(
            decoded.tables[1].rows[0].r#type,
            pb::OperationType::Update as i32
        );
    }

    #[test]
    fn results_flatten_back_into_request_order() {
        let body = pb::BatchWriteRowResponse {
            tables: vec![
                pb::TableInBatchWriteRowResponse {
                    table_name: "b".to_string(),
                    rows: vec![pb::RowInBatchWriteRowResponse {
                        is_ok: false,
                        error: Some(pb::Error {
                            code: "OTSConditionCheckFail".to_string(),
                            message: None,
                        }),
                        consumed: None,
                        row: None,
                    }],
                },
                pb::TableInBatchWriteRowResponse {
                    table_name: "a".to_string(),
                    rows: vec![ok_row(), ok_row()],
                },
            ],
        }
        .encode_to_vec();

        let req = request();
        let resp = req.decode_response(&body, meta()).unwrap();
        assert_eq!(resp.rows.len(), req.rows.len());
        assert_matches!(resp.rows[0].result, Ok(None));
        assert_matches!(&resp.rows[1].result, Err(e) if e.code == "OTSConditionCheckFail");
        assert_matches!(resp.rows[2].result, Ok(None));
        // user data rides along in request order
        assert_eq!(resp.rows[0].user_data.as_deref(), Some(&b"p"[..]));
        assert_eq!(resp.rows[1].user_data, None);
        assert_eq!(resp.rows[2].user_data.as_deref(), Some(&b"d"[..]));
    }

    #[test]
    fn missing_row_result_is_corrupted() {
        let body = pb::BatchWriteRowResponse {
            tables: vec![pb::TableInBatchWriteRowResponse {
                table_name: "a".to_string(),
                rows: vec![ok_row(), ok_row()],
            }],
        }
        .encode_to_vec();
        assert_matches!(request().decode_response(&body, meta()), Err(_));
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(BatchWriteRowRequest::new().validate().is_err());
    }
}
