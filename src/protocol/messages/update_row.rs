//! `UpdateRow` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::Result;
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::protocol::plainbuffer::{reader, writer};
use crate::types::{ConsumedCapacity, Row, RowUpdateChange};

use super::{
    condition_to_pb, consumed_from_pb, decode_pb, return_content_to_pb, OtsRequest, ResponseMeta,
};

#[derive(Debug, Clone)]
pub struct UpdateRowRequest {
    pub change: RowUpdateChange,
}

impl UpdateRowRequest {
    pub fn new(change: RowUpdateChange) -> Self {
        Self { change }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateRowResponse {
    pub request_id: String,
    pub trace_id: String,
    pub consumed: ConsumedCapacity,
    pub row: Option<Row>,
}

impl OtsRequest for UpdateRowRequest {
    type Response = UpdateRowResponse;

    const ACTION: Action = Action::UpdateRow;

    fn validate(&self) -> Result<()> {
        self.change.validate()
    }

    fn encode_body(&self) -> Result<Bytes> {
        let body = pb::UpdateRowRequest {
            table_name: self.change.table_name.clone(),
            row_change: writer::update_change(&self.change)?.to_vec(),
            condition: condition_to_pb(&self.change.condition)?,
            return_content: return_content_to_pb(self.change.return_type),
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::UpdateRowResponse = decode_pb(body, "UpdateRow")?;
        let row = match body.row {
            Some(row) if !row.is_empty() => Some(reader::read_row(&row)?),
            _ => None,
        };
        Ok(UpdateRowResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            consumed: consumed_from_pb(body.consumed),
            row,
        })
    }
}
