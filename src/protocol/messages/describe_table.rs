//! `DescribeTable` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::types::{ReservedThroughputDetails, TableMeta, TableOptions};

use super::{
    decode_pb, table_meta_from_pb, table_options_from_pb, throughput_details_from_pb, OtsRequest,
    ResponseMeta,
};

#[derive(Debug, Clone)]
pub struct DescribeTableRequest {
    pub table_name: String,
}

impl DescribeTableRequest {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DescribeTableResponse {
    pub request_id: String,
    pub trace_id: String,
    pub table_meta: TableMeta,
    pub reserved_throughput_details: ReservedThroughputDetails,
    pub table_options: Option<TableOptions>,
}

impl OtsRequest for DescribeTableRequest {
    type Response = DescribeTableResponse;

    const ACTION: Action = Action::DescribeTable;

    fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        Ok(())
    }

    fn encode_body(&self) -> Result<Bytes> {
        let body = pb::DescribeTableRequest {
            table_name: self.table_name.clone(),
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::DescribeTableResponse = decode_pb(body, "DescribeTable")?;
        Ok(DescribeTableResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            table_meta: table_meta_from_pb(body.table_meta)?,
            reserved_throughput_details: throughput_details_from_pb(
                body.reserved_throughput_details,
            ),
            table_options: body.table_options.map(table_options_from_pb),
        })
    }
}
