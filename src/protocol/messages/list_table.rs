//! `ListTable` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::Result;
use crate::protocol::action::Action;
use crate::protocol::pb;

use super::{decode_pb, OtsRequest, ResponseMeta};

#[derive(Debug, Clone, Default)]
pub struct ListTableRequest {}

#[derive(Debug, Clone)]
pub struct ListTableResponse {
    pub request_id: String,
    pub trace_id: String,
    pub table_names: Vec<String>,
}

impl OtsRequest for ListTableRequest {
    type Response = ListTableResponse;

    const ACTION: Action = Action::ListTable;

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn encode_body(&self) -> Result<Bytes> {
        Ok(pb::ListTableRequest {}.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::ListTableResponse = decode_pb(body, "ListTable")?;
        Ok(ListTableResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            table_names: body.table_names,
        })
    }
}
