//! `DeleteRow` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::Result;
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::protocol::plainbuffer::{reader, writer};
use crate::types::{ConsumedCapacity, Row, RowDeleteChange};

use super::{
    condition_to_pb, consumed_from_pb, decode_pb, return_content_to_pb, OtsRequest, ResponseMeta,
};

#[derive(Debug, Clone)]
pub struct DeleteRowRequest {
    pub change: RowDeleteChange,
}

impl DeleteRowRequest {
    pub fn new(change: RowDeleteChange) -> Self {
        Self { change }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteRowResponse {
    pub request_id: String,
    pub trace_id: String,
    pub consumed: ConsumedCapacity,
    pub row: Option<Row>,
}

impl OtsRequest for DeleteRowRequest {
    type Response = DeleteRowResponse;

    const ACTION: Action = Action::DeleteRow;

    fn validate(&self) -> Result<()> {
        self.change.validate()
    }

    fn encode_body(&self) -> Result<Bytes> {
        let body = pb::DeleteRowRequest {
            table_name: self.change.table_name.clone(),
            primary_key: writer::delete_change(&self.change)?.to_vec(),
            condition: condition_to_pb(&self.change.condition)?,
            return_content: return_content_to_pb(self.change.return_type),
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::DeleteRowResponse = decode_pb(body, "DeleteRow")?;
        let row = match body.row {
            Some(row) if !row.is_empty() => Some(reader::read_row(&row)?),
            _ => None,
        };
        Ok(DeleteRowResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            consumed: consumed_from_pb(body.consumed),
            row,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimaryKey;

    #[test]
    fn body_carries_delete_marker_blob() {
        let change = RowDeleteChange::new("t", PrimaryKey::new().column("pkey", 123i64));
        let want_blob = writer::delete_change(&change).unwrap();
        let body = DeleteRowRequest::new(change).encode_body().unwrap();
        let decoded = pb::DeleteRowRequest::decode(&body[..]).unwrap();
        assert_eq!(decoded.primary_key, want_blob.to_vec());
    }
}
