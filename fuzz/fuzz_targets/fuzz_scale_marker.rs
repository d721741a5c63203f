#![no_main]

use libfuzzer_sys::fuzz_target;
use mediaidx::index::range::{locate_scale_marker, SCALE_MARKER};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if let Ok(Some(offset)) = locate_scale_marker(Cursor::new(data)) {
        let offset = offset as usize;
        assert!(data[offset..].starts_with(SCALE_MARKER.as_bytes()));
    }
});
