//! `PutRow` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::Result;
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::protocol::plainbuffer::{reader, writer};
use crate::types::{ConsumedCapacity, Row, RowPutChange};

use super::{
    condition_to_pb, consumed_from_pb, decode_pb, return_content_to_pb, OtsRequest, ResponseMeta,
};

#[derive(Debug, Clone)]
pub struct PutRowRequest {
    pub change: RowPutChange,
}

impl PutRowRequest {
    pub fn new(change: RowPutChange) -> Self {
        Self { change }
    }
}

#[derive(Debug, Clone)]
pub struct PutRowResponse {
    pub request_id: String,
    pub trace_id: String,
    pub consumed: ConsumedCapacity,
    /// Present when the request asked for the stored primary key.
    pub row: Option<Row>,
}

impl OtsRequest for PutRowRequest {
    type Response = PutRowResponse;

    const ACTION: Action = Action::PutRow;

    fn validate(&self) -> Result<()> {
        self.change.validate()
    }

    fn encode_body(&self) -> Result<Bytes> {
        let body = pb::PutRowRequest {
            table_name: self.change.table_name.clone(),
            row: writer::put_change(&self.change)?.to_vec(),
            condition: condition_to_pb(&self.change.condition)?,
            return_content: return_content_to_pb(self.change.return_type),
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::PutRowResponse = decode_pb(body, "PutRow")?;
        let row = match body.row {
            Some(row) if !row.is_empty() => Some(reader::read_row(&row)?),
            _ => None,
        };
        Ok(PutRowResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            consumed: consumed_from_pb(body.consumed),
            row,
        })
    }
}
