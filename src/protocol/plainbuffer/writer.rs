//! PlainBuffer encoders.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::types::{
    Attribute, AttributeValue, PrimaryKey, PrimaryKeyColumn, PrimaryKeyValue, RowDeleteChange,
    RowPutChange, RowUpdateChange, Update,
};

use super::crc8::{crc8, crc8_bytes, crc8_u32, crc8_u64};
use super::{cell_type, tag, variant, HEADER};

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_cell_name(out: &mut Vec<u8>, checksum: &mut u8, name: &str) {
    out.push(tag::CELL_NAME);
    put_u32(out, name.len() as u32);
    out.extend_from_slice(name.as_bytes());
    *checksum = crc8_bytes(*checksum, name.as_bytes());
}

fn write_str_blob_value(out: &mut Vec<u8>, checksum: &mut u8, data: &[u8], vt: u8) {
    put_u32(out, 1 + 4 + data.len() as u32);
    out.push(vt);
    put_u32(out, data.len() as u32);
    out.extend_from_slice(data);
    *checksum = crc8(*checksum, vt);
    *checksum = crc8_u32(*checksum, data.len() as u32);
    *checksum = crc8_bytes(*checksum, data);
}

fn write_int_value(out: &mut Vec<u8>, checksum: &mut u8, value: i64) {
    put_u32(out, 1 + 8);
    out.push(variant::INTEGER);
    put_u64(out, value as u64);
    *checksum = crc8(*checksum, variant::INTEGER);
    *checksum = crc8_u64(*checksum, value as u64);
}

fn write_pk_value(out: &mut Vec<u8>, checksum: &mut u8, value: &PrimaryKeyValue) -> Result<()> {
    out.push(tag::CELL_VALUE);
    match value {
        PrimaryKeyValue::Integer(v) => write_int_value(out, checksum, *v),
        PrimaryKeyValue::String(s) => {
            write_str_blob_value(out, checksum, s.as_bytes(), variant::STRING)
        }
        PrimaryKeyValue::Binary(b) => write_str_blob_value(out, checksum, b, variant::BLOB),
        PrimaryKeyValue::InfMin => write_special_value(out, checksum, variant::INF_MIN),
        PrimaryKeyValue::InfMax => write_special_value(out, checksum, variant::INF_MAX),
        PrimaryKeyValue::AutoIncrement => {
            write_special_value(out, checksum, variant::AUTO_INCREMENT)
        }
        PrimaryKeyValue::None => {
            return Err(Error::validation(
                "a none primary-key value cannot be encoded",
            ))
        }
    }
    Ok(())
}

fn write_special_value(out: &mut Vec<u8>, checksum: &mut u8, vt: u8) {
    put_u32(out, 1);
    out.push(vt);
    *checksum = crc8(*checksum, vt);
}

fn write_attr_value(out: &mut Vec<u8>, checksum: &mut u8, value: &AttributeValue) -> Result<()> {
    out.push(tag::CELL_VALUE);
    match value {
        AttributeValue::Integer(v) => write_int_value(out, checksum, *v),
        AttributeValue::String(s) => {
            write_str_blob_value(out, checksum, s.as_bytes(), variant::STRING)
        }
        AttributeValue::Binary(b) => write_str_blob_value(out, checksum, b, variant::BLOB),
        AttributeValue::Boolean(b) => {
            put_u32(out, 2);
            out.push(variant::BOOLEAN);
            out.push(*b as u8);
            *checksum = crc8(*checksum, variant::BOOLEAN);
            *checksum = crc8(*checksum, *b as u8);
        }
        AttributeValue::Double(d) => {
            put_u32(out, 1 + 8);
            out.push(variant::DOUBLE);
            put_u64(out, d.to_bits());
            *checksum = crc8(*checksum, variant::DOUBLE);
            *checksum = crc8_u64(*checksum, d.to_bits());
        }
        AttributeValue::None => {
            return Err(Error::validation("a none attribute value cannot be encoded"))
        }
    }
    Ok(())
}

fn write_pk_cell(out: &mut Vec<u8>, row_checksum: &mut u8, col: &PrimaryKeyColumn) -> Result<()> {
    let mut cell_checksum = 0u8;
    out.push(tag::CELL);
    write_cell_name(out, &mut cell_checksum, &col.name);
    write_pk_value(out, &mut cell_checksum, &col.value)?;
    out.push(tag::CELL_CHECKSUM);
    out.push(cell_checksum);
    *row_checksum = crc8(*row_checksum, cell_checksum);
    Ok(())
}

fn write_row_key(out: &mut Vec<u8>, row_checksum: &mut u8, pk: &PrimaryKey) -> Result<()> {
    out.push(tag::ROW_KEY);
    for col in pk.iter() {
        write_pk_cell(out, row_checksum, col)?;
    }
    Ok(())
}

fn write_attr_cell(out: &mut Vec<u8>, row_checksum: &mut u8, attr: &Attribute) -> Result<()> {
    let mut cell_checksum = 0u8;
    out.push(tag::CELL);
    write_cell_name(out, &mut cell_checksum, &attr.name);
    write_attr_value(out, &mut cell_checksum, &attr.value)?;
    if let Some(ts) = attr.timestamp {
        out.push(tag::CELL_TIMESTAMP);
        put_u64(out, ts as u64);
        cell_checksum = crc8_u64(cell_checksum, ts as u64);
    }
    out.push(tag::CELL_CHECKSUM);
    out.push(cell_checksum);
    *row_checksum = crc8(*row_checksum, cell_checksum);
    Ok(())
}

fn write_update_cell(out: &mut Vec<u8>, row_checksum: &mut u8, update: &Update) -> Result<()> {
    let mut cell_checksum = 0u8;
    out.push(tag::CELL);
    write_cell_name(out, &mut cell_checksum, update.name());

    let mut timestamp = None;
    let mut marker = None;
    match update {
        Update::Put(attr) => {
            write_attr_value(out, &mut cell_checksum, &attr.value)?;
            timestamp = attr.timestamp;
        }
        Update::DeleteOneVersion { timestamp: ts, .. } => {
            out.push(tag::CELL_TYPE);
            out.push(cell_type::DELETE_ONE_VERSION);
            marker = Some(cell_type::DELETE_ONE_VERSION);
            timestamp = Some(*ts);
        }
        Update::DeleteAllVersions { .. } => {
            out.push(tag::CELL_TYPE);
            out.push(cell_type::DELETE_ALL_VERSIONS);
            marker = Some(cell_type::DELETE_ALL_VERSIONS);
        }
    }
    if let Some(ts) = timestamp {
        out.push(tag::CELL_TIMESTAMP);
        put_u64(out, ts as u64);
    }

    // The checksum order differs from the wire order: the timestamp enters
    // the CRC before the cell-type marker.
    if let Some(ts) = timestamp {
        cell_checksum = crc8_u64(cell_checksum, ts as u64);
    }
    if let Some(marker) = marker {
        cell_checksum = crc8(cell_checksum, marker);
    }

    out.push(tag::CELL_CHECKSUM);
    out.push(cell_checksum);
    *row_checksum = crc8(*row_checksum, cell_checksum);
    Ok(())
}

fn finish_row(out: &mut Vec<u8>, row_checksum: u8) {
    out.push(tag::ROW_CHECKSUM);
    out.push(row_checksum);
}

/// Encodes a bare primary key, as point reads and batch gets carry it.
pub fn primary_key(pk: &PrimaryKey) -> Result<Bytes> {
    let mut out = Vec::new();
    let mut checksum = 0u8;
    put_u32(&mut out, HEADER);
    write_row_key(&mut out, &mut checksum, pk)?;
    checksum = crc8(checksum, 0); // no delete marker
    finish_row(&mut out, checksum);
    Ok(out.into())
}

/// Encodes a whole-row put.
pub fn put_change(change: &RowPutChange) -> Result<Bytes> {
    let mut out = Vec::new();
    let mut checksum = 0u8;
    put_u32(&mut out, HEADER);
    write_row_key(&mut out, &mut checksum, &change.primary_key)?;
    if !change.attributes.is_empty() {
        out.push(tag::ROW_DATA);
        for attr in &change.attributes {
            write_attr_cell(&mut out, &mut checksum, attr)?;
        }
    }
    checksum = crc8(checksum, 0);
    finish_row(&mut out, checksum);
    Ok(out.into())
}

/// Encodes a row update.
pub fn update_change(change: &RowUpdateChange) -> Result<Bytes> {
    let mut out = Vec::new();
    let mut checksum = 0u8;
    put_u32(&mut out, HEADER);
    write_row_key(&mut out, &mut checksum, &change.primary_key)?;
    if !change.updates.is_empty() {
        out.push(tag::ROW_DATA);
        for update in &change.updates {
            write_update_cell(&mut out, &mut checksum, update)?;
        }
    }
    checksum = crc8(checksum, 0);
    finish_row(&mut out, checksum);
    Ok(out.into())
}

/// Encodes a row deletion.
pub fn delete_change(change: &RowDeleteChange) -> Result<Bytes> {
    let mut out = Vec::new();
    let mut checksum = 0u8;
    put_u32(&mut out, HEADER);
    write_row_key(&mut out, &mut checksum, &change.primary_key)?;
    out.push(tag::ROW_DELETE_MARKER);
    checksum = crc8(checksum, 1);
    finish_row(&mut out, checksum);
    Ok(out.into())
}

/// Encodes the bare cell-value form used by filter comparands: a type byte
/// plus the payload, with no length prefix and no checksum.
pub fn filter_value(value: &AttributeValue) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match value {
        AttributeValue::Integer(v) => {
            out.push(variant::INTEGER);
            put_u64(&mut out, *v as u64);
        }
        AttributeValue::String(s) => {
            out.push(variant::STRING);
            put_u32(&mut out, s.len() as u32);
            out.extend_from_slice(s.as_bytes());
        }
        AttributeValue::Binary(b) => {
            out.push(variant::BLOB);
            put_u32(&mut out, b.len() as u32);
            out.extend_from_slice(b);
        }
        AttributeValue::Boolean(b) => {
            out.push(variant::BOOLEAN);
            out.push(*b as u8);
        }
        AttributeValue::Double(d) => {
            out.push(variant::DOUBLE);
            put_u64(&mut out, d.to_bits());
        }
        AttributeValue::None => {
            return Err(Error::validation("a none value cannot be a filter comparand"))
        }
    }
    Ok(out)
}
