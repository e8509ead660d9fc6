//! `DeleteTable` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::pb;

use super::{decode_pb, OtsRequest, ResponseMeta};

#[derive(Debug, Clone)]
pub struct DeleteTableRequest {
    pub table_name: String,
}

impl DeleteTableRequest {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteTableResponse {
    pub request_id: String,
    pub trace_id: String,
}

impl OtsRequest for DeleteTableRequest {
    type Response = DeleteTableResponse;

    const ACTION: Action = Action::DeleteTable;

    fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        Ok(())
    }

    fn encode_body(&self) -> Result<Bytes> {
        let body = pb::DeleteTableRequest {
            table_name: self.table_name.clone(),
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let _body: pb::DeleteTableResponse = decode_pb(body, "DeleteTable")?;
        Ok(DeleteTableResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
        })
    }
}
