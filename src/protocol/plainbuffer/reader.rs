//! PlainBuffer decoders.
//!
//! Any framing violation or checksum mismatch fails with a
//! corrupted-response error carrying the `file:line` of the failed check,
//! so a bad buffer can be traced without a captured payload.

use crate::error::{Error, Result};
use crate::types::{
    Attribute, AttributeValue, PrimaryKey, PrimaryKeyColumn, PrimaryKeyValue, Row,
};

use super::crc8::{crc8, crc8_bytes, crc8_u32, crc8_u64};
use super::{tag, variant, HEADER};

macro_rules! corrupted {
    ($($arg:tt)*) => {
        Error::corrupted_response(format!($($arg)*), file!(), line!())
    };
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8> {
        if self.remaining() < 1 {
            return Err(corrupted!("unexpected end of buffer"));
        }
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    fn read_u32(&mut self) -> Result<u32> {
        if self.remaining() < 4 {
            return Err(corrupted!("unexpected end of buffer"));
        }
        let v = u32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        Ok(v)
    }

    fn read_u64(&mut self) -> Result<u64> {
        if self.remaining() < 8 {
            return Err(corrupted!("unexpected end of buffer"));
        }
        let v = u64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        Ok(v)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(corrupted!("blob of {len} bytes overruns the buffer"));
        }
        let s = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(s)
    }

    fn peek_tag(&self, expect: u8) -> bool {
        self.pos < self.buf.len() && self.buf[self.pos] == expect
    }

    fn expect_tag(&mut self, expect: u8) -> Result<()> {
        let got = self.read_u8()?;
        if got != expect {
            return Err(corrupted!("expected tag {expect:#04x}, got {got:#04x}"));
        }
        Ok(())
    }
}

fn read_header(cursor: &mut Cursor<'_>) -> Result<()> {
    let header = cursor.read_u32()?;
    if header != HEADER {
        return Err(corrupted!("bad header {header:#010x}"));
    }
    Ok(())
}

fn read_name<'a>(cursor: &mut Cursor<'a>, checksum: &mut u8) -> Result<&'a [u8]> {
    cursor.expect_tag(tag::CELL_NAME)?;
    let len = cursor.read_u32()? as usize;
    let name = cursor.read_slice(len)?;
    *checksum = crc8_bytes(*checksum, name);
    Ok(name)
}

fn name_to_string(name: &[u8]) -> Result<String> {
    String::from_utf8(name.to_vec()).map_err(|_| corrupted!("cell name is not valid UTF-8"))
}

fn read_pk_value(cursor: &mut Cursor<'_>, checksum: &mut u8) -> Result<PrimaryKeyValue> {
    cursor.expect_tag(tag::CELL_VALUE)?;
    let _total_len = cursor.read_u32()?;
    let vt = cursor.read_u8()?;
    match vt {
        variant::INTEGER => {
            let v = cursor.read_u64()?;
            *checksum = crc8(*checksum, variant::INTEGER);
            *checksum = crc8_u64(*checksum, v);
            Ok(PrimaryKeyValue::Integer(v as i64))
        }
        variant::STRING => {
            *checksum = crc8(*checksum, variant::STRING);
            let len = cursor.read_u32()?;
            *checksum = crc8_u32(*checksum, len);
            let data = cursor.read_slice(len as usize)?;
            *checksum = crc8_bytes(*checksum, data);
            Ok(PrimaryKeyValue::String(
                String::from_utf8(data.to_vec())
                    .map_err(|_| corrupted!("string cell is not valid UTF-8"))?,
            ))
        }
        variant::BLOB => {
            *checksum = crc8(*checksum, variant::BLOB);
            let len = cursor.read_u32()?;
            *checksum = crc8_u32(*checksum, len);
            let data = cursor.read_slice(len as usize)?;
            *checksum = crc8_bytes(*checksum, data);
            Ok(PrimaryKeyValue::binary(data.to_vec()))
        }
        other => Err(corrupted!(
            "variant type {other:#04x} is not valid in a primary-key cell"
        )),
    }
}

fn read_attr_value(cursor: &mut Cursor<'_>, checksum: &mut u8) -> Result<AttributeValue> {
    cursor.expect_tag(tag::CELL_VALUE)?;
    let _total_len = cursor.read_u32()?;
    let vt = cursor.read_u8()?;
    match vt {
        variant::INTEGER => {
            let v = cursor.read_u64()?;
            *checksum = crc8(*checksum, variant::INTEGER);
            *checksum = crc8_u64(*checksum, v);
            Ok(AttributeValue::Integer(v as i64))
        }
        variant::STRING => {
            *checksum = crc8(*checksum, variant::STRING);
            let len = cursor.read_u32()?;
            *checksum = crc8_u32(*checksum, len);
            let data = cursor.read_slice(len as usize)?;
            *checksum = crc8_bytes(*checksum, data);
            Ok(AttributeValue::String(
                String::from_utf8(data.to_vec())
                    .map_err(|_| corrupted!("string cell is not valid UTF-8"))?,
            ))
        }
        variant::BLOB => {
            *checksum = crc8(*checksum, variant::BLOB);
            let len = cursor.read_u32()?;
            *checksum = crc8_u32(*checksum, len);
            let data = cursor.read_slice(len as usize)?;
            *checksum = crc8_bytes(*checksum, data);
            Ok(AttributeValue::binary(data.to_vec()))
        }
        variant::DOUBLE => {
            let bits = cursor.read_u64()?;
            *checksum = crc8(*checksum, variant::DOUBLE);
            *checksum = crc8_u64(*checksum, bits);
            Ok(AttributeValue::Double(f64::from_bits(bits)))
        }
        variant::BOOLEAN => {
            let v = cursor.read_u8()?;
            *checksum = crc8(*checksum, variant::BOOLEAN);
            *checksum = crc8(*checksum, (v != 0) as u8);
            Ok(AttributeValue::Boolean(v != 0))
        }
        other => Err(corrupted!(
            "variant type {other:#04x} is not valid in an attribute cell"
        )),
    }
}

fn verify_cell_checksum(cursor: &mut Cursor<'_>, computed: u8) -> Result<()> {
    cursor.expect_tag(tag::CELL_CHECKSUM)?;
    let oracle = cursor.read_u8()?;
    if oracle != computed {
        return Err(corrupted!(
            "cell checksum mismatch: buffer says {oracle:#04x}, computed {computed:#04x}"
        ));
    }
    Ok(())
}

fn read_pk_cell(cursor: &mut Cursor<'_>, row_checksum: &mut u8) -> Result<PrimaryKeyColumn> {
    cursor.expect_tag(tag::CELL)?;
    let mut cell_checksum = 0u8;
    let name = read_name(cursor, &mut cell_checksum)?;
    let name = name_to_string(name)?;
    let value = read_pk_value(cursor, &mut cell_checksum)?;
    verify_cell_checksum(cursor, cell_checksum)?;
    *row_checksum = crc8(*row_checksum, cell_checksum);
    Ok(PrimaryKeyColumn { name, value })
}

fn read_row_key(cursor: &mut Cursor<'_>, row_checksum: &mut u8) -> Result<PrimaryKey> {
    cursor.expect_tag(tag::ROW_KEY)?;
    let mut pk = PrimaryKey::new();
    while cursor.peek_tag(tag::CELL) {
        pk.0.push(read_pk_cell(cursor, row_checksum)?);
    }
    if pk.is_empty() {
        return Err(corrupted!("row key carries no cells"));
    }
    Ok(pk)
}

fn read_attr_cell(cursor: &mut Cursor<'_>, row_checksum: &mut u8) -> Result<Attribute> {
    cursor.expect_tag(tag::CELL)?;
    let mut cell_checksum = 0u8;
    let name = read_name(cursor, &mut cell_checksum)?;
    let name = name_to_string(name)?;
    let value = read_attr_value(cursor, &mut cell_checksum)?;
    let timestamp = if cursor.peek_tag(tag::CELL_TIMESTAMP) {
        cursor.read_u8()?;
        let ts = cursor.read_u64()?;
        cell_checksum = crc8_u64(cell_checksum, ts);
        Some(ts as i64)
    } else {
        None
    };
    verify_cell_checksum(cursor, cell_checksum)?;
    *row_checksum = crc8(*row_checksum, cell_checksum);
    Ok(Attribute {
        name,
        value,
        timestamp,
    })
}

fn read_row_body(cursor: &mut Cursor<'_>) -> Result<Row> {
    let mut row_checksum = 0u8;
    let primary_key = read_row_key(cursor, &mut row_checksum)?;

    let mut attributes = Vec::new();
    if cursor.peek_tag(tag::ROW_DATA) {
        cursor.read_u8()?;
        while cursor.peek_tag(tag::CELL) {
            attributes.push(read_attr_cell(cursor, &mut row_checksum)?);
        }
    }

    // rows handed back by the service never carry a delete marker
    row_checksum = crc8(row_checksum, 0);

    cursor.expect_tag(tag::ROW_CHECKSUM)?;
    let oracle = cursor.read_u8()?;
    if oracle != row_checksum {
        return Err(corrupted!(
            "row checksum mismatch: buffer says {oracle:#04x}, computed {row_checksum:#04x}"
        ));
    }

    Ok(Row {
        primary_key,
        attributes,
    })
}

/// Decodes a buffer holding exactly one row.
pub fn read_row(buf: &[u8]) -> Result<Row> {
    let mut cursor = Cursor::new(buf);
    read_header(&mut cursor)?;
    let row = read_row_body(&mut cursor)?;
    if cursor.remaining() != 0 {
        return Err(corrupted!(
            "{} trailing bytes after the row",
            cursor.remaining()
        ));
    }
    Ok(row)
}

/// Decodes a buffer holding any number of rows after a single header, as
/// `GetRange` returns them. An empty buffer decodes to no rows.
pub fn read_rows(buf: &[u8]) -> Result<Vec<Row>> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }
    let mut cursor = Cursor::new(buf);
    read_header(&mut cursor)?;
    let mut rows = Vec::new();
    while cursor.remaining() > 0 {
        rows.push(read_row_body(&mut cursor)?);
    }
    Ok(rows)
}

/// Decodes a buffer holding a bare primary key.
pub fn read_primary_key(buf: &[u8]) -> Result<PrimaryKey> {
    let mut cursor = Cursor::new(buf);
    read_header(&mut cursor)?;
    let mut row_checksum = 0u8;
    let pk = read_row_key(&mut cursor, &mut row_checksum)?;
    row_checksum = crc8(row_checksum, 0);
    cursor.expect_tag(tag::ROW_CHECKSUM)?;
    let oracle = cursor.read_u8()?;
    if oracle != row_checksum {
        return Err(corrupted!(
            "row checksum mismatch: buffer says {oracle:#04x}, computed {row_checksum:#04x}"
        ));
    }
    if cursor.remaining() != 0 {
        return Err(corrupted!(
            "{} trailing bytes after the primary key",
            cursor.remaining()
        ));
    }
    Ok(pk)
}

#[cfg(test)]
mod tests {
    use super::super::writer;
    use super::*;
    use crate::error;
    use crate::types::RowPutChange;

    use assert_matches::assert_matches;

    fn sample_row_buf() -> Vec<u8> {
        let pk = PrimaryKey::new().column("pkey", 123i64);
        let change = RowPutChange::new("t", pk)
            .attribute(Attribute::new("attr", "abc"))
            .attribute(Attribute::new("num", 1.5f64).with_timestamp(1_000_000));
        writer::put_change(&change).unwrap().to_vec()
    }

    #[test]
    fn reads_back_written_row() {
        let row = read_row(&sample_row_buf()).unwrap();
        assert_eq!(row.primary_key.get("pkey"), Some(&PrimaryKeyValue::Integer(123)));
        assert_eq!(
            row.attribute("attr").map(|a| &a.value),
            Some(&AttributeValue::String("abc".to_string()))
        );
        assert_eq!(row.attribute("num").and_then(|a| a.timestamp), Some(1_000_000));
    }

    #[test]
    fn bad_header_is_corrupted_response() {
        let mut buf = sample_row_buf();
        buf[0] = 0x76;
        let err = read_row(&buf).unwrap_err();
        assert_eq!(err.http_status, error::HTTP_CORRUPTED_RESPONSE);
        assert!(err.message.contains("reader.rs"), "{}", err.message);
    }

    #[test]
    fn flipped_payload_byte_fails_cell_checksum() {
        let mut buf = sample_row_buf();
        // flip one byte of the integer payload of the primary key
        let pos = buf.windows(4).position(|w| w == b"pkey").unwrap() + 4;
        buf[pos + 6] ^= 0xff;
        let err = read_row(&buf).unwrap_err();
        assert_eq!(err.http_status, error::HTTP_CORRUPTED_RESPONSE);
        assert!(err.message.contains("checksum"), "{}", err.message);
    }

    #[test]
    fn flipped_row_checksum_is_detected() {
        let mut buf = sample_row_buf();
        let last = buf.len() - 1;
        buf[last] ^= 0xff;
        let err = read_row(&buf).unwrap_err();
        assert!(err.message.contains("row checksum"), "{}", err.message);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let mut buf = sample_row_buf();
        buf.push(0x00);
        assert_matches!(read_row(&buf), Err(_));
    }

    #[test]
    fn truncation_is_rejected_everywhere() {
        let buf = sample_row_buf();
        for len in 0..buf.len() {
            assert_matches!(read_row(&buf[..len]), Err(_), "truncated at {len}");
        }
    }

    #[test]
    fn multiple_rows_share_one_header() {
        let pk1 = PrimaryKey::new().column("pkey", 1i64);
        let pk2 = PrimaryKey::new().column("pkey", 2i64);
        let buf1 = writer::put_change(&RowPutChange::new("t", pk1.clone())).unwrap();
        let buf2 = writer::put_change(&RowPutChange::new("t", pk2.clone())).unwrap();

        // rows concatenate after a single header
        let mut buf = buf1.to_vec();
        buf.extend_from_slice(&buf2[4..]);

        let rows = read_rows(&buf).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].primary_key, pk1);
        assert_eq!(rows[1].primary_key, pk2);
    }

    #[test]
    fn empty_buffer_means_no_rows() {
        assert!(read_rows(&[]).unwrap().is_empty());
    }

    #[test]
    fn primary_key_roundtrip() {
        let pk = PrimaryKey::new()
            .column("part", "p0")
            .column("id", 42i64);
        let buf = writer::primary_key(&pk).unwrap();
        assert_eq!(read_primary_key(&buf).unwrap(), pk);
    }

    #[test]
    fn infinities_are_rejected_in_read_keys() {
        let pk = PrimaryKey::new().column("id", PrimaryKeyValue::InfMin);
        let buf = writer::primary_key(&pk).unwrap();
        assert_matches!(read_primary_key(&buf), Err(_));
    }
}
