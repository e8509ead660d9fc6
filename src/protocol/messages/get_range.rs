//! `GetRange` request and response.

use std::cmp::Ordering;

use bytes::Bytes;
use prost::Message;

use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::protocol::plainbuffer::{reader, writer};
use crate::types::{ColumnCondition, ConsumedCapacity, PrimaryKey, Row};

use super::{consumed_from_pb, decode_pb, filter_to_pb_bytes, OtsRequest, ResponseMeta, TimeRange};

/// Scan direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub struct GetRangeRequest {
    pub table_name: String,
    pub direction: Direction,
    /// First key of the scan; infinities are allowed.
    pub inclusive_start_primary_key: PrimaryKey,
    /// First key past the scan; infinities are allowed.
    pub exclusive_end_primary_key: PrimaryKey,
    pub columns_to_get: Vec<String>,
    pub time_range: Option<TimeRange>,
    pub max_versions: Option<i32>,
    pub limit: Option<i32>,
    pub filter: Option<ColumnCondition>,
}

impl GetRangeRequest {
    pub fn new(
        table_name: impl Into<String>,
        inclusive_start_primary_key: PrimaryKey,
        exclusive_end_primary_key: PrimaryKey,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            direction: Direction::Forward,
            inclusive_start_primary_key,
            exclusive_end_primary_key,
            columns_to_get: Vec::new(),
            time_range: None,
            max_versions: None,
            limit: None,
            filter: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetRangeResponse {
    pub request_id: String,
    pub trace_id: String,
    pub consumed: ConsumedCapacity,
    pub rows: Vec<Row>,
    /// Set when the scan stopped early; pass it back as the next start key.
    pub next_start_primary_key: Option<PrimaryKey>,
}

impl OtsRequest for GetRangeRequest {
    type Response = GetRangeResponse;

    const ACTION: Action = Action::GetRange;

    fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        self.inclusive_start_primary_key.validate_as_range_bound()?;
        self.exclusive_end_primary_key.validate_as_range_bound()?;
        let order = self
            .inclusive_start_primary_key
            .compare(&self.exclusive_end_primary_key)?;
        match self.direction {
            Direction::Forward if order != Ordering::Less => {
                return Err(Error::validation(
                    "a forward scan needs its start key below its end key",
                ))
            }
            Direction::Backward if order != Ordering::Greater => {
                return Err(Error::validation(
                    "a backward scan needs its start key above its end key",
                ))
            }
            _ => {}
        }
        if let Some(limit) = self.limit {
            if limit <= 0 {
                return Err(Error::validation("limit must be positive"));
            }
        }
        if let Some(versions) = self.max_versions {
            if versions <= 0 {
                return Err(Error::validation("max versions must be positive"));
            }
        }
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }
        Ok(())
    }

    fn encode_body(&self) -> Result<Bytes> {
        let direction = match self.direction {
            Direction::Forward => pb::Direction::Forward,
            Direction::Backward => pb::Direction::Backward,
        };
        let body = pb::GetRangeRequest {
            table_name: self.table_name.clone(),
            direction: direction as i32,
            columns_to_get: self.columns_to_get.clone(),
            time_range: self.time_range.map(TimeRange::to_pb),
            max_versions: self.max_versions,
            limit: self.limit,
            inclusive_start_primary_key: writer::primary_key(&self.inclusive_start_primary_key)?
                .to_vec(),
            exclusive_end_primary_key: writer::primary_key(&self.exclusive_end_primary_key)?
                .to_vec(),
            filter: self.filter.as_ref().map(filter_to_pb_bytes).transpose()?,
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::GetRangeResponse = decode_pb(body, "GetRange")?;
        let rows = reader::read_rows(&body.rows)?;
        let next_start_primary_key = match body.next_start_primary_key {
            Some(key) if !key.is_empty() => Some(reader::read_primary_key(&key)?),
            _ => None,
        };
        Ok(GetRangeResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            consumed: consumed_from_pb(body.consumed),
            rows,
            next_start_primary_key,
        })
    }
}
