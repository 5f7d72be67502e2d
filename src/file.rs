//! Record file utilities.

use std::fs;
use std::io::prelude::*;
use std::path::Path;

use log;

use crate::buffer::{read_full, BlockReader, BlockWriter, BLOCK_SIZE};
use crate::record::{Record, RECORD_SIZE};
use crate::sort::SortError;

/// Returns the file length, checking that the file consists of whole records.
pub fn record_file_len(path: &Path) -> Result<u64, SortError> {
    let len = fs::metadata(path)
        .map_err(|err| SortError::Open {
            path: path.into(),
            err,
        })?
        .len();

    if len % RECORD_SIZE as u64 != 0 {
        return Err(SortError::Misaligned { path: path.into(), len });
    }

    return Ok(len);
}

/// Returns the number of blocks in a file, a trailing partial block counts as a block.
pub fn count_blocks(path: &Path) -> Result<u64, SortError> {
    let len = fs::metadata(path)
        .map_err(|err| SortError::Open {
            path: path.into(),
            err,
        })?
        .len();

    Ok((len + BLOCK_SIZE as u64 - 1) / BLOCK_SIZE as u64)
}

/// Copies the content of `src` into `dst` block by block, `dst` is truncated first.
/// Returns the number of copied bytes.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, SortError> {
    let mut reader = fs::File::open(src).map_err(|err| SortError::Open {
        path: src.into(),
        err,
    })?;
    let mut writer = fs::File::create(dst).map_err(|err| SortError::Open {
        path: dst.into(),
        err,
    })?;

    let mut buf = vec![0u8; BLOCK_SIZE];
    let mut copied = 0u64;
    loop {
        let read = read_full(&mut reader, &mut buf).map_err(|err| SortError::Read {
            path: src.into(),
            offset: copied,
            err,
        })?;
        if read == 0 {
            break;
        }
        writer.write_all(&buf[..read]).map_err(|err| SortError::Write {
            path: dst.into(),
            offset: copied,
            err,
        })?;
        copied += read as u64;
    }
    log::debug!("copied {} bytes from {} to {}", copied, src.display(), dst.display());

    return Ok(copied);
}

/// Checks whether the records of a file are in ascending key order.
pub fn is_sorted(path: &Path) -> Result<bool, SortError> {
    let mut prev: Option<Record> = None;
    for record in BlockReader::open(path)? {
        let record = record?;
        if let Some(prev) = prev {
            if record.cmp_key(&prev).is_lt() {
                return Ok(false);
            }
        }
        prev = Some(record);
    }

    return Ok(true);
}

/// Writes records to a file, the file is truncated first. Returns the file length.
pub fn write_records<I>(path: &Path, records: I) -> Result<u64, SortError>
where
    I: IntoIterator<Item = Record>,
{
    let mut writer = BlockWriter::create(path)?;
    for record in records.into_iter() {
        writer.push(&record);
        if writer.is_full() {
            writer.flush()?;
        }
    }

    writer.finish()
}

/// Reads all records of a file.
pub fn read_records(path: &Path) -> Result<Vec<Record>, SortError> {
    BlockReader::open(path)?.collect()
}
