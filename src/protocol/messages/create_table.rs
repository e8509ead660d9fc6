//! `CreateTable` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::Result;
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::types::{ReservedThroughput, TableMeta, TableOptions};

use super::{
    decode_pb, table_meta_to_pb, table_options_to_pb, OtsRequest, ResponseMeta,
};

#[derive(Debug, Clone)]
pub struct CreateTableRequest {
    pub table_meta: TableMeta,
    pub reserved_throughput: ReservedThroughput,
    pub table_options: Option<TableOptions>,
}

impl CreateTableRequest {
    pub fn new(table_meta: TableMeta) -> Self {
        Self {
            table_meta,
            reserved_throughput: ReservedThroughput::new(0, 0),
            table_options: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTableResponse {
    pub request_id: String,
    pub trace_id: String,
}

impl OtsRequest for CreateTableRequest {
    type Response = CreateTableResponse;

    const ACTION: Action = Action::CreateTable;

    fn validate(&self) -> Result<()> {
        self.table_meta.validate()?;
        self.reserved_throughput.validate()?;
        if let Some(options) = &self.table_options {
            options.validate()?;
        }
        Ok(())
    }

    fn encode_body(&self) -> Result<Bytes> {
        let body = pb::CreateTableRequest {
            table_meta: table_meta_to_pb(&self.table_meta),
            reserved_throughput: pb::ReservedThroughput {
                capacity_unit: pb::CapacityUnit {
                    read: self.reserved_throughput.capacity_unit.read,
                    write: self.reserved_throughput.capacity_unit.write,
                },
            },
            table_options: self.table_options.as_ref().map(table_options_to_pb),
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let _body: pb::CreateTableResponse = decode_pb(body, "CreateTable")?;
        Ok(CreateTableResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
        })
    }
}
