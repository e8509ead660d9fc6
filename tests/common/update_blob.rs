//! A permissive PlainBuffer parser for write-side blobs.
//!
//! The client library only decodes the row shape servers respond with;
//! the mock backend additionally has to understand what clients *send*:
//! puts, updates with cell-type markers and deletions with a row delete
//! marker. Checksums are skipped, the client writer is trusted here.

use tablestore::types::{Attribute, AttributeValue, PrimaryKey, PrimaryKeyValue};

const TAG_ROW_KEY: u8 = 0x1;
const TAG_ROW_DATA: u8 = 0x2;
const TAG_CELL: u8 = 0x3;
const TAG_CELL_NAME: u8 = 0x4;
const TAG_CELL_VALUE: u8 = 0x5;
const TAG_CELL_TYPE: u8 = 0x6;
const TAG_CELL_TIMESTAMP: u8 = 0x7;
const TAG_ROW_DELETE_MARKER: u8 = 0x8;
const TAG_ROW_CHECKSUM: u8 = 0x9;
const TAG_CELL_CHECKSUM: u8 = 0xa;

const DELETE_ALL_VERSIONS: u8 = 0x1;
const DELETE_ONE_VERSION: u8 = 0x3;

#[derive(Debug, Clone)]
pub enum UpdateOp {
    Put(Attribute),
    DeleteOneVersion { name: String, timestamp: i64 },
    DeleteAllVersions { name: String },
}

#[derive(Debug)]
pub struct WriteBlob {
    pub primary_key: PrimaryKey,
    pub ops: Vec<UpdateOp>,
    pub delete_marker: bool,
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn u8(&mut self) -> Result<u8, ()> {
        let v = *self.buf.get(self.pos).ok_or(())?;
        self.pos += 1;
        Ok(v)
    }

    fn u32(&mut self) -> Result<u32, ()> {
        let bytes = self.buf.get(self.pos..self.pos + 4).ok_or(())?;
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes.try_into().map_err(|_| ())?))
    }

    fn u64(&mut self) -> Result<u64, ()> {
        let bytes = self.buf.get(self.pos..self.pos + 8).ok_or(())?;
        self.pos += 8;
        Ok(u64::from_le_bytes(bytes.try_into().map_err(|_| ())?))
    }

    fn slice(&mut self, len: usize) -> Result<&'a [u8], ()> {
        let bytes = self.buf.get(self.pos..self.pos + len).ok_or(())?;
        self.pos += len;
        Ok(bytes)
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn done(&self) -> bool {
        self.pos >= self.buf.len()
    }
}

pub fn parse_write_blob(buf: &[u8]) -> Result<WriteBlob, ()> {
    let mut cursor = Cursor { buf, pos: 0 };
    if cursor.u32()? != 0x75 {
        return Err(());
    }

    if cursor.u8()? != TAG_ROW_KEY {
        return Err(());
    }
    let mut primary_key = PrimaryKey::new();
    while cursor.peek() == Some(TAG_CELL) {
        let (name, value, _, _) = parse_cell(&mut cursor)?;
        primary_key = primary_key.column(name, value.ok_or(())?.into_pk()?);
    }

    let mut ops = Vec::new();
    if cursor.peek() == Some(TAG_ROW_DATA) {
        cursor.u8()?;
        while cursor.peek() == Some(TAG_CELL) {
            let (name, value, cell_type, timestamp) = parse_cell(&mut cursor)?;
            let op = match cell_type {
                Some(DELETE_ALL_VERSIONS) => UpdateOp::DeleteAllVersions { name },
                Some(DELETE_ONE_VERSION) => UpdateOp::DeleteOneVersion {
                    name,
                    timestamp: timestamp.ok_or(())?,
                },
                Some(_) => return Err(()),
                None => {
                    let mut attr = Attribute::new(name, value.ok_or(())?.into_attr()?);
                    attr.timestamp = timestamp;
                    UpdateOp::Put(attr)
                }
            };
            ops.push(op);
        }
    }

    let mut delete_marker = false;
    if cursor.peek() == Some(TAG_ROW_DELETE_MARKER) {
        cursor.u8()?;
        delete_marker = true;
    }

    if cursor.u8()? != TAG_ROW_CHECKSUM {
        return Err(());
    }
    cursor.u8()?;
    if !cursor.done() {
        return Err(());
    }

    Ok(WriteBlob {
        primary_key,
        ops,
        delete_marker,
    })
}

enum CellValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    Str(String),
    Blob(Vec<u8>),
    InfMin,
    InfMax,
    AutoIncrement,
}

impl CellValue {
    fn into_pk(self) -> Result<PrimaryKeyValue, ()> {
        Ok(match self {
            Self::Int(v) => PrimaryKeyValue::Integer(v),
            Self::Str(v) => PrimaryKeyValue::String(v),
            Self::Blob(v) => PrimaryKeyValue::binary(v),
            Self::InfMin => PrimaryKeyValue::InfMin,
            Self::InfMax => PrimaryKeyValue::InfMax,
            Self::AutoIncrement => PrimaryKeyValue::AutoIncrement,
            _ => return Err(()),
        })
    }

    fn into_attr(self) -> Result<AttributeValue, ()> {
        Ok(match self {
            Self::Int(v) => AttributeValue::Integer(v),
            Self::Double(v) => AttributeValue::Double(v),
            Self::Bool(v) => AttributeValue::Boolean(v),
            Self::Str(v) => AttributeValue::String(v),
            Self::Blob(v) => AttributeValue::binary(v),
            _ => return Err(()),
        })
    }
}

type Cell = (String, Option<CellValue>, Option<u8>, Option<i64>);

fn parse_cell(cursor: &mut Cursor<'_>) -> Result<Cell, ()> {
    if cursor.u8()? != TAG_CELL {
        return Err(());
    }
    if cursor.u8()? != TAG_CELL_NAME {
        return Err(());
    }
    let name_len = cursor.u32()? as usize;
    let name = String::from_utf8(cursor.slice(name_len)?.to_vec()).map_err(|_| ())?;

    let mut value = None;
    if cursor.peek() == Some(TAG_CELL_VALUE) {
        cursor.u8()?;
        let _total = cursor.u32()?;
        value = Some(parse_value(cursor)?);
    }

    let mut cell_type = None;
    if cursor.peek() == Some(TAG_CELL_TYPE) {
        cursor.u8()?;
        cell_type = Some(cursor.u8()?);
    }

    let mut timestamp = None;
    if cursor.peek() == Some(TAG_CELL_TIMESTAMP) {
        cursor.u8()?;
        timestamp = Some(cursor.u64()? as i64);
    }

    if cursor.peek() == Some(TAG_CELL_CHECKSUM) {
        cursor.u8()?;
        cursor.u8()?;
    }

    Ok((name, value, cell_type, timestamp))
}

fn parse_value(cursor: &mut Cursor<'_>) -> Result<CellValue, ()> {
    let variant = cursor.u8()?;
    Ok(match variant {
        0x0 => CellValue::Int(cursor.u64()? as i64),
        0x1 => CellValue::Double(f64::from_bits(cursor.u64()?)),
        0x2 => CellValue::Bool(cursor.u8()? != 0),
        0x3 => {
            let len = cursor.u32()? as usize;
            CellValue::Str(String::from_utf8(cursor.slice(len)?.to_vec()).map_err(|_| ())?)
        }
        0x7 => {
            let len = cursor.u32()? as usize;
            CellValue::Blob(cursor.slice(len)?.to_vec())
        }
        0x9 => CellValue::InfMin,
        0xa => CellValue::InfMax,
        0xb => CellValue::AutoIncrement,
        _ => return Err(()),
    })
}
