//! Sorted output printers.
//!
//! Records are printed as `"<id> <key>"`, five per line: every fifth record is followed by a line terminator,
//! the others by a single space.

use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;

use crate::buffer::{read_full, BlockReader, BLOCK_SIZE};
use crate::record::{Record, RECORD_SIZE};
use crate::sort::SortError;

/// Platform line terminator.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Platform line terminator.
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

const RECORDS_PER_LINE: usize = 5;

/// Prints every record of a file.
pub fn write_records<W: Write>(path: &Path, out: &mut W) -> Result<(), SortError> {
    write_grouped(BlockReader::open(path)?, out)
}

/// Prints the first record of every block of a file.
pub fn write_first_records_of_blocks<W: Write>(path: &Path, out: &mut W) -> Result<(), SortError> {
    let mut file = fs::File::open(path).map_err(|err| SortError::Open {
        path: path.into(),
        err,
    })?;

    let mut offset = 0u64;
    let firsts = std::iter::from_fn(|| {
        let mut bytes = [0u8; RECORD_SIZE];
        let read = file
            .seek(io::SeekFrom::Start(offset))
            .and_then(|_| read_full(&mut file, &mut bytes));

        let item = match read {
            Ok(read) if read < RECORD_SIZE => return None,
            Ok(_) => Ok(Record::decode(&bytes)),
            Err(err) => Err(SortError::Read {
                path: path.into(),
                offset,
                err,
            }),
        };
        offset += BLOCK_SIZE as u64;
        Some(item)
    });

    write_grouped(firsts, out)
}

fn write_grouped<I, W>(records: I, out: &mut W) -> Result<(), SortError>
where
    I: IntoIterator<Item = Result<Record, SortError>>,
    W: Write,
{
    for (count, record) in records.into_iter().enumerate() {
        let separator = if (count + 1) % RECORDS_PER_LINE == 0 { LINE_ENDING } else { " " };
        write!(out, "{}{}", record?, separator).map_err(SortError::IO)?;
    }
    out.flush().map_err(SortError::IO)?;

    Ok(())
}
