//! `ComputeSplitPointsBySize` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::protocol::plainbuffer::reader;
use crate::types::{ConsumedCapacity, PrimaryKey, PrimaryKeyColumnSchema};

use super::{consumed_from_pb, decode_pb, table_meta_from_pb, OtsRequest, ResponseMeta};

#[derive(Debug, Clone)]
pub struct ComputeSplitPointsBySizeRequest {
    pub table_name: String,
    /// Desired split size, in hundreds of megabytes.
    pub split_size: i64,
}

impl ComputeSplitPointsBySizeRequest {
    pub fn new(table_name: impl Into<String>, split_size: i64) -> Self {
        Self {
            table_name: table_name.into(),
            split_size,
        }
    }
}

/// Which server holds the keys between two split points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLocation {
    pub location: String,
    /// How many consecutive splits live there.
    pub repeat: i64,
}

#[derive(Debug, Clone)]
pub struct ComputeSplitPointsBySizeResponse {
    pub request_id: String,
    pub trace_id: String,
    pub consumed: ConsumedCapacity,
    pub schema: Vec<PrimaryKeyColumnSchema>,
    /// Split points in ascending order, exclusive of both ends.
    pub split_points: Vec<PrimaryKey>,
    pub locations: Vec<SplitLocation>,
}

impl OtsRequest for ComputeSplitPointsBySizeRequest {
    type Response = ComputeSplitPointsBySizeResponse;

    const ACTION: Action = Action::ComputeSplitPointsBySize;

    fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        if self.split_size <= 0 {
            return Err(Error::validation("split size must be positive"));
        }
        Ok(())
    }

    fn encode_body(&self) -> Result<Bytes> {
        let body = pb::ComputeSplitPointsBySizeRequest {
            table_name: self.table_name.clone(),
            split_size: self.split_size,
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::ComputeSplitPointsBySizeResponse = decode_pb(body, "ComputeSplitPointsBySize")?;
        let schema = table_meta_from_pb(pb::TableMeta {
            table_name: self.table_name.clone(),
            primary_key: body.schema,
        })?
        .schema;
        let split_points = body
            .split_points
            .iter()
            .map(|point| reader::read_primary_key(point))
            .collect::<Result<Vec<_>>>()?;
        Ok(ComputeSplitPointsBySizeResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            consumed: consumed_from_pb(body.consumed),
            schema,
            split_points,
            locations: body
                .locations
                .into_iter()
                .map(|l| SplitLocation {
                    location: l.location,
                    repeat: l.repeat,
                })
                .collect(),
        })
    }
}
