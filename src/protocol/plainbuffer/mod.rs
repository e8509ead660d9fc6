//! PlainBuffer, the binary row format of the wire protocol.
//!
//! A buffer is a 4-byte little-endian header (`0x75`), a sequence of tagged
//! fields and a trailing row checksum. Cells carry their own checksum; the
//! row checksum covers all cell checksums plus one byte telling whether the
//! row bears a delete marker.
//!
//! Checksums use CRC-8 (polynomial `0x07`, init 0). The field order fed to
//! the CRC is fixed and differs from the wire order for update cells: the
//! timestamp enters the CRC before the cell-type marker even though it is
//! written after it. Both sides must reproduce this order bit-exactly.

pub mod crc8;
pub mod reader;
pub mod writer;

pub(crate) const HEADER: u32 = 0x75;

/// Field tags.
pub(crate) mod tag {
    pub const ROW_KEY: u8 = 0x1;
    pub const ROW_DATA: u8 = 0x2;
    pub const CELL: u8 = 0x3;
    pub const CELL_NAME: u8 = 0x4;
    pub const CELL_VALUE: u8 = 0x5;
    pub const CELL_TYPE: u8 = 0x6;
    pub const CELL_TIMESTAMP: u8 = 0x7;
    pub const ROW_DELETE_MARKER: u8 = 0x8;
    pub const ROW_CHECKSUM: u8 = 0x9;
    pub const CELL_CHECKSUM: u8 = 0xa;
}

/// Type bytes inside a cell value.
pub(crate) mod variant {
    pub const INTEGER: u8 = 0x0;
    pub const DOUBLE: u8 = 0x1;
    pub const BOOLEAN: u8 = 0x2;
    pub const STRING: u8 = 0x3;
    pub const NULL: u8 = 0x6;
    pub const BLOB: u8 = 0x7;
    pub const INF_MIN: u8 = 0x9;
    pub const INF_MAX: u8 = 0xa;
    pub const AUTO_INCREMENT: u8 = 0xb;
}

/// Cell-type markers of update cells.
pub(crate) mod cell_type {
    pub const DELETE_ALL_VERSIONS: u8 = 0x1;
    pub const DELETE_ONE_VERSION: u8 = 0x3;
}
