//! Color range flag patch for d2v artifacts.
//!
//! d2vwitch writes a `YUVRGB_Scale=<flag>` line in the project header, where
//! `1` means limited range and `0` full range. Reused artifacts may have been
//! written for a different range than the caller asks for, so the flag is
//! rewritten in place whenever it disagrees.

use crate::index::types::ColorRange;
use crate::utils::LogSink;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Marker at the start of the range line
pub const SCALE_MARKER: &str = "YUVRGB_Scale";

/// Offset of the flag byte from the marker, just past `YUVRGB_Scale=`
pub const FLAG_OFFSET: u64 = SCALE_MARKER.len() as u64 + 1;

/// Locate the marker line; returns the byte offset of the marker itself.
///
/// The scan is forward-only and stops at the first matching line.
pub fn locate_scale_marker<R: BufRead>(mut reader: R) -> io::Result<Option<u64>> {
    let mut offset = 0u64;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            return Ok(None);
        }

        let indent = line
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        if line[indent..].starts_with(SCALE_MARKER.as_bytes()) {
            return Ok(Some(offset + indent as u64));
        }

        offset += read as u64;
    }
}

/// What [`correct_range`] did to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePatch {
    /// Flag already matched
    Unchanged,
    /// Flag rewritten
    Patched,
    /// Marker missing, file unreadable, or flag byte unexpected
    Skipped,
}

/// Make the artifact's range flag match `range`.
///
/// Never fails: problems are logged and the file is left as it was.
pub fn correct_range(path: &Path, range: ColorRange, log: &mut LogSink) -> RangePatch {
    match try_correct_range(path, range) {
        Ok(Some(true)) => {
            log.info(format!(
                "corrected input range byte in {} to '{}' - {}",
                path.display(),
                range.flag() as char,
                range
            ));
            RangePatch::Patched
        }
        Ok(Some(false)) => RangePatch::Unchanged,
        Ok(None) => {
            log.error(format!(
                "not a d2v index file or not compatible, input range byte check failed for {}",
                path.display()
            ));
            RangePatch::Skipped
        }
        Err(e) => {
            log.error(format!(
                "input range byte check failed for {}: {}",
                path.display(),
                e
            ));
            RangePatch::Skipped
        }
    }
}

/// `Some(patched)` on success, `None` when the file is not in the expected layout
fn try_correct_range(path: &Path, range: ColorRange) -> io::Result<Option<bool>> {
    let marker = {
        let file = File::open(path)?;
        match locate_scale_marker(BufReader::new(file))? {
            Some(offset) => offset,
            None => return Ok(None),
        }
    };

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    file.seek(SeekFrom::Start(marker + FLAG_OFFSET - 1))?;
    let mut found = [0u8; 2];
    if file.read_exact(&mut found).is_err() {
        return Ok(None);
    }
    if found[0] != b'=' || !matches!(found[1], b'0' | b'1') {
        return Ok(None);
    }
    if found[1] == range.flag() {
        return Ok(Some(false));
    }

    file.seek(SeekFrom::Start(marker))?;
    file.write_all(format!("{}={}", SCALE_MARKER, range.flag() as char).as_bytes())?;
    file.flush()?;
    Ok(Some(true))
}
