#![no_main]
use libfuzzer_sys::fuzz_target;

use tablestore::protocol::plainbuffer::reader;

// The readers must reject arbitrary input with a typed error, never a
// panic. Exercise all three entry points on the same bytes.
fuzz_target!(|data: &[u8]| {
    reader::read_row(data).ok();
    reader::read_rows(data).ok();
    reader::read_primary_key(data).ok();
});
