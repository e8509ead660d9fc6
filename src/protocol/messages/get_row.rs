//! `GetRow` request and response.

use bytes::Bytes;
use prost::Message;

use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::pb;
use crate::protocol::plainbuffer::{reader, writer};
use crate::types::{ColumnCondition, ConsumedCapacity, PrimaryKey, Row};

use super::{consumed_from_pb, decode_pb, filter_to_pb_bytes, OtsRequest, ResponseMeta, TimeRange};

#[derive(Debug, Clone)]
pub struct GetRowRequest {
    pub table_name: String,
    pub primary_key: PrimaryKey,
    /// Empty means all columns.
    pub columns_to_get: Vec<String>,
    pub time_range: Option<TimeRange>,
    pub max_versions: Option<i32>,
    pub filter: Option<ColumnCondition>,
}

impl GetRowRequest {
    pub fn new(table_name: impl Into<String>, primary_key: PrimaryKey) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key,
            columns_to_get: Vec::new(),
            time_range: None,
            max_versions: None,
            filter: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetRowResponse {
    pub request_id: String,
    pub trace_id: String,
    pub consumed: ConsumedCapacity,
    /// `None` when no row lives under the requested key.
    pub row: Option<Row>,
}

impl OtsRequest for GetRowRequest {
    type Response = GetRowResponse;

    const ACTION: Action = Action::GetRow;

    fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::validation("table name must be non-empty"));
        }
        self.primary_key.validate_for_point_read()?;
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
        let body = pb::GetRowRequest {
            table_name: self.table_name.clone(),
            primary_key: writer::primary_key(&self.primary_key)?.to_vec(),
            columns_to_get: self.columns_to_get.clone(),
            time_range: self.time_range.map(TimeRange::to_pb),
            max_versions: self.max_versions,
            filter: self.filter.as_ref().map(filter_to_pb_bytes).transpose()?,
        };
        Ok(body.encode_to_vec().into())
    }

    fn decode_response(&self, body: &[u8], meta: ResponseMeta) -> Result<Self::Response> {
        let body: pb::GetRowResponse = decode_pb(body, "GetRow")?;
        let row = if body.row.is_empty() {
            None
        } else {
            Some(reader::read_row(&body.row)?)
        };
        Ok(GetRowResponse {
            request_id: meta.request_id,
            trace_id: meta.trace_id,
            consumed: consumed_from_pb(body.consumed),
            row,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::meta;
    use super::*;
    use crate::types::{Attribute, CompareOp, RowPutChange, SingleColumnCondition};

    fn request() -> GetRowRequest {
        GetRowRequest::new("t", PrimaryKey::new().column("pkey", 123i64))
    }

    fn consumed() -> pb::ConsumedCapacity {
        pb::ConsumedCapacity {
            capacity_unit: pb::CapacityUnit {
                read: Some(1),
                write: Some(0),
            },
        }
    }

    #[test]
    fn body_carries_encoded_key_and_filter() {
        let mut req = request();
        req.max_versions = Some(1);
        req.filter = Some(SingleColumnCondition::new("attr", CompareOp::Equal, "abc").into());
        let body = req.encode_body().unwrap();
        let decoded = pb::GetRowRequest::decode(&body[..]).unwrap();

        assert_eq!(
            reader::read_primary_key(&decoded.primary_key).unwrap(),
            req.primary_key
        );
        assert_eq!(decoded.max_versions, Some(1));
        let filter = pb::Filter::decode(&decoded.filter.unwrap()[..]).unwrap();
        assert_eq!(filter.r#type, pb::FilterType::FtSingleColumnValue as i32);
    }

    #[test]
    fn empty_row_decodes_as_miss() {
        let body = pb::GetRowResponse {
            consumed: consumed(),
            row: Vec::new(),
        }
        .encode_to_vec();
        let resp = request().decode_response(&body, meta()).unwrap();
        assert!(resp.row.is_none());
        assert_eq!(resp.consumed.capacity_unit.read, Some(1));
    }

    #[test]
    fn present_row_decodes() {
        let pk = PrimaryKey::new().column("pkey", 123i64);
        let change = RowPutChange::new("t", pk.clone()).attribute(Attribute::new("attr", "abc"));
        let body = pb::GetRowResponse {
            consumed: consumed(),
            row: writer::put_change(&change).unwrap().to_vec(),
        }
        .encode_to_vec();
        let resp = request().decode_response(&body, meta()).unwrap();
        let row = resp.row.unwrap();
        assert_eq!(row.primary_key, pk);
        assert_eq!(row.attributes.len(), 1);
    }

    #[test]
    fn range_bounds_are_rejected_in_point_reads() {
        use crate::types::PrimaryKeyValue;
        let req = GetRowRequest::new(
            "t",
            PrimaryKey::new().column("pkey", PrimaryKeyValue::InfMin),
        );
        assert!(req.validate().is_err());
    }
}
