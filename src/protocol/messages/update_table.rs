//! `UpdateTable` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::types::{ReservedThroughput, ReservedThroughputDetails, TableOptions};

use super::{
    decode_pb, table_options_from_pb, table_options_to_pb, throughput_details_from_pb, OtsRequest,
    ResponseMeta,
};

#[derive(Debug, Clone)]
pub struct UpdateTableRequest {
    pub table_name: String,
    pub reserved_throughput: Option<ReservedThroughput>,
    pub table_options: Option<TableOptions>,
}

impl UpdateTableRequest {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            reserved_throughput: None,
            table_options: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateTableResponse {
    pub request_id: String,
    pub trace_id: String,
    pub reserved_throughput_details: ReservedThroughputDetails,
    pub table_options: Option<TableOptions>,
}

impl OtsRequest for UpdateTableRequest {
    type Response = UpdateTableResponse;

    const ACTION: Action = Action::UpdateTable;

    fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        if self.reserved_throughput.is_none() && self.table_options.is_none() {
            return Err(Error::validation(
                "an update must change throughput or options",
            ));
        }
        if let Some(throughput) = &self.reserved_throughput {
            throughput.validate()?;
        }
        if let Some(options) = &self.table_options {
            options.validate()?;
        }
        Ok(())
    }

    fn encode_body(&self) -> Result<Bytes> {
        let body = pb::UpdateTableRequest {
            table_name: self.table_name.clone(),
            reserved_throughput: self.reserved_throughput.map(|t| pb::ReservedThroughput {
                capacity_unit: pb::CapacityUnit {
                    read: t.capacity_unit.read,
                    write: t.capacity_unit.write,
                },
            }),
            table_options: self.table_options.as_ref().map(table_options_to_pb),
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::UpdateTableResponse = decode_pb(body, "UpdateTable")?;
        Ok(UpdateTableResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            reserved_throughput_details: throughput_details_from_pb(
                body.reserved_throughput_details,
            ),
            table_options: body.table_options.map(table_options_from_pb),
        })
    }
}
