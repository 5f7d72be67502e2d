//! Block-sized I/O buffers.
//!
//! All bulk reads and writes go through a single block-sized buffer, only the last block of a file may be partial.

use std::fs;
use std::io::{self, prelude::*};
use std::path::{Path, PathBuf};

use log;

use crate::record::{Record, RECORD_SIZE};
use crate::sort::SortError;

/// Number of records in a block.
pub const RECORDS_PER_BLOCK: usize = 512;

/// Block size in bytes.
pub const BLOCK_SIZE: usize = RECORDS_PER_BLOCK * RECORD_SIZE;

/// Reads from `reader` until `buf` is full or end of file is reached.
/// Returns the number of bytes read, a short count means end of file.
pub(crate) fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }

    return Ok(filled);
}

/// Sequential record reader. Reads a file one block at a time.
pub struct BlockReader {
    path: PathBuf,
    file: fs::File,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    // file offset of the first buffered byte
    offset: u64,
}

impl BlockReader {
    /// Opens a file for reading.
    pub fn open(path: &Path) -> Result<Self, SortError> {
        let file = fs::File::open(path).map_err(|err| SortError::Open {
            path: path.into(),
            err,
        })?;

        return Ok(BlockReader {
            path: path.into(),
            file,
            buf: vec![0u8; BLOCK_SIZE].into_boxed_slice(),
            pos: 0,
            filled: 0,
            offset: 0,
        });
    }

    /// Returns the file offset of the next record.
    pub fn position(&self) -> u64 {
        self.offset + self.pos as u64
    }

    fn refill(&mut self) -> Result<usize, SortError> {
        self.offset += self.filled as u64;
        self.pos = 0;
        self.filled = read_full(&mut self.file, &mut self.buf).map_err(|err| SortError::Read {
            path: self.path.clone(),
            offset: self.offset,
            err,
        })?;

        return Ok(self.filled);
    }
}

impl Iterator for BlockReader {
    type Item = Result<Record, SortError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + RECORD_SIZE > self.filled {
            match self.refill() {
                // trailing bytes that do not make up a whole record are ignored
                Ok(filled) if filled < RECORD_SIZE => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err)),
            }
        }

        let record = Record::decode(&self.buf[self.pos..]);
        self.pos += RECORD_SIZE;

        Some(Ok(record))
    }
}

/// Block output buffer. Accumulates encoded records until a block is full, the owner decides when to flush.
pub struct BlockWriter {
    path: PathBuf,
    file: fs::File,
    buf: Vec<u8>,
    // number of bytes already written to the file
    offset: u64,
}

impl BlockWriter {
    /// Creates (or truncates) a file for writing.
    pub fn create(path: &Path) -> Result<Self, SortError> {
        let file = fs::File::create(path).map_err(|err| SortError::Open {
            path: path.into(),
            err,
        })?;

        return Ok(BlockWriter {
            path: path.into(),
            file,
            buf: Vec::with_capacity(BLOCK_SIZE),
            offset: 0,
        });
    }

    /// Adds a record to the buffer.
    pub fn push(&mut self, record: &Record) {
        debug_assert!(!self.is_full(), "block buffer overflow");
        self.buf.extend_from_slice(&record.encode());
    }

    /// Returns buffered bytes count.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Checks if the buffer holds a whole block.
    pub fn is_full(&self) -> bool {
        self.buf.len() >= BLOCK_SIZE
    }

    /// Returns the logical output position: written bytes plus buffered bytes.
    pub fn position(&self) -> u64 {
        self.offset + self.buf.len() as u64
    }

    /// Writes buffered data to the file. Returns the file offset the data was written at.
    pub fn flush(&mut self) -> Result<u64, SortError> {
        let start = self.offset;
        if self.buf.is_empty() {
            return Ok(start);
        }

        self.file.write_all(&self.buf).map_err(|err| SortError::Write {
            path: self.path.clone(),
            offset: start,
            err,
        })?;
        self.offset += self.buf.len() as u64;
        self.buf.clear();

        return Ok(start);
    }

    /// Flushes the remaining data and closes the file. Returns the file length.
    pub fn finish(mut self) -> Result<u64, SortError> {
        self.flush()?;
        log::trace!("closing {} ({} bytes)", self.path.display(), self.offset);

        return Ok(self.offset);
    }
}
