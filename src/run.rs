//! Sorted run cursor.

use std::cmp::Ordering;
use std::fs;
use std::io::{self, prelude::*};
use std::path::{Path, PathBuf};

use log;

use crate::buffer::{read_full, BLOCK_SIZE};
use crate::record::{Record, RECORD_SIZE};
use crate::sort::SortError;

/// Read cursor over a single sorted run `[start, end)` of a record file.
///
/// The cursor buffers one block at a time starting from the run start, so run boundaries do not have to be
/// block-aligned: a block may hold the tail of this run followed by the head of the next one. Bytes past the run end
/// are never decoded.
pub struct RunCursor {
    path: PathBuf,
    file: fs::File,
    end: u64,
    buf: Box<[u8]>,
    // next unread byte in the buffer
    pos: usize,
    // buffered bytes belonging to the run
    filled: usize,
    // file offset right after the buffered block
    file_pos: u64,
    // number of buffered bytes past the run end
    overrun: u64,
    current: Record,
}

impl RunCursor {
    /// Opens a cursor over the run `[start, end)` of a file and loads its first record.
    pub fn open(path: &Path, start: u64, end: u64) -> Result<Self, SortError> {
        if end < start || end - start < RECORD_SIZE as u64 {
            return Err(SortError::InvalidRun { start, end });
        }

        let mut file = fs::File::open(path).map_err(|err| SortError::Open {
            path: path.into(),
            err,
        })?;
        file.seek(io::SeekFrom::Start(start)).map_err(|err| SortError::Read {
            path: path.into(),
            offset: start,
            err,
        })?;

        let mut cursor = RunCursor {
            path: path.into(),
            file,
            end,
            buf: vec![0u8; BLOCK_SIZE].into_boxed_slice(),
            pos: 0,
            filled: 0,
            file_pos: start,
            overrun: 0,
            current: Record::new(0, 0.0),
        };

        if !cursor.refill()? {
            // run starts past the end of file
            return Err(SortError::InvalidRun { start, end });
        }
        cursor.current = cursor.decode();
        log::trace!("run cursor opened over [{}, {}) of {}", start, end, path.display());

        return Ok(cursor);
    }

    /// Returns the current record.
    pub fn current(&self) -> &Record {
        &self.current
    }

    /// Compares cursors by their current record keys.
    pub fn cmp_current(&self, other: &RunCursor) -> Ordering {
        self.current.cmp_key(&other.current)
    }

    /// Moves to the next record of the run.
    /// Returns `false` if the run is exhausted, the current record is left unchanged in that case.
    pub fn advance(&mut self) -> Result<bool, SortError> {
        if self.pos + RECORD_SIZE > self.filled {
            // the buffered block already reaches the run end
            if self.overrun > 0 || self.file_pos >= self.end {
                return Ok(false);
            }
            if !self.refill()? {
                return Ok(false);
            }
        }
        self.current = self.decode();

        return Ok(true);
    }

    /// Closes the cursor releasing the underlying file.
    pub fn close(self) {
        log::trace!("run cursor closed at {} of {}", self.file_pos, self.path.display());
    }

    fn decode(&mut self) -> Record {
        let record = Record::decode(&self.buf[self.pos..self.filled]);
        self.pos += RECORD_SIZE;
        record
    }

    /// Loads the next block. Returns `false` if no whole record of the run is available.
    fn refill(&mut self) -> Result<bool, SortError> {
        let read = read_full(&mut self.file, &mut self.buf).map_err(|err| SortError::Read {
            path: self.path.clone(),
            offset: self.file_pos,
            err,
        })?;
        if read == 0 {
            return Ok(false);
        }

        self.file_pos += read as u64;
        if self.file_pos > self.end {
            self.overrun = self.file_pos - self.end;
        }
        // a full-block overrun leaves nothing to read
        self.filled = read - (self.overrun.min(read as u64) as usize);
        self.pos = 0;

        return Ok(self.filled >= RECORD_SIZE);
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use rstest::*;

    use super::RunCursor;
    use crate::buffer::{BlockWriter, RECORDS_PER_BLOCK};
    use crate::record::{Record, RECORD_SIZE};
    use crate::sort::SortError;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write_sequence(path: &Path, count: usize) {
        let mut writer = BlockWriter::create(path).unwrap();
        for i in 0..count {
            writer.push(&Record::new(i as i64, i as f64));
            if writer.is_full() {
                writer.flush().unwrap();
            }
        }
        writer.finish().unwrap();
    }

    fn collect_run(path: &Path, start: usize, end: usize) -> Vec<i64> {
        let mut cursor = RunCursor::open(path, (start * RECORD_SIZE) as u64, (end * RECORD_SIZE) as u64).unwrap();
        let mut ids = vec![cursor.current().id()];
        while cursor.advance().unwrap() {
            ids.push(cursor.current().id());
        }
        // exhaustion is sticky
        assert!(!cursor.advance().unwrap());
        cursor.close();
        ids
    }

    #[rstest]
    fn test_run_cursor_single_block(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("runs.bin");
        write_sequence(&path, 16 * RECORDS_PER_BLOCK);

        let mut cursor = RunCursor::open(&path, 0, 8192).unwrap();
        assert_eq!(*cursor.current(), Record::new(0, 0.0));
        for _ in 0..(RECORDS_PER_BLOCK - 1) {
            assert!(cursor.advance().unwrap());
        }
        assert_eq!(*cursor.current(), Record::new(511, 511.0));
        assert!(!cursor.advance().unwrap());
        assert_eq!(*cursor.current(), Record::new(511, 511.0));
        cursor.close();
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(RECORDS_PER_BLOCK - 1)]
    #[case(RECORDS_PER_BLOCK)]
    #[case(RECORDS_PER_BLOCK + 1)]
    #[case(2 * RECORDS_PER_BLOCK - 1)]
    #[case(2 * RECORDS_PER_BLOCK)]
    #[case(2 * RECORDS_PER_BLOCK + 1)]
    #[case(3 * RECORDS_PER_BLOCK + 100)]
    fn test_run_cursor_run_lengths(tmp_dir: tempfile::TempDir, #[case] run_len: usize) {
        let total = 4 * RECORDS_PER_BLOCK + 7;
        let path = tmp_dir.path().join("runs.bin");
        write_sequence(&path, total);

        // consecutive runs of the same length, the last one is shorter, none are block-aligned past the first
        let mut start = 0;
        while start < total {
            let end = (start + run_len).min(total);
            let expected = Vec::from_iter((start..end).map(|i| i as i64));
            assert_eq!(collect_run(&path, start, end), expected, "run [{}, {})", start, end);
            start = end;
        }
    }

    #[rstest]
    #[case(0, 1)]
    #[case(100, 612)]
    #[case(511, 513)]
    #[case(512, 1024)]
    #[case(700, 2055)]
    #[case(1000, 2055)]
    fn test_run_cursor_unaligned_start(tmp_dir: tempfile::TempDir, #[case] start: usize, #[case] end: usize) {
        let path = tmp_dir.path().join("runs.bin");
        write_sequence(&path, 2055);

        let expected = Vec::from_iter((start..end).map(|i| i as i64));
        assert_eq!(collect_run(&path, start, end), expected);
    }

    #[rstest]
    fn test_run_cursor_end_past_file(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("runs.bin");
        write_sequence(&path, 10);

        // end of file is reached before the run end
        let expected = Vec::from_iter(5..10);
        assert_eq!(collect_run(&path, 5, 20), expected);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(16, 8)]
    #[case(160, 320)]
    fn test_run_cursor_invalid_run(tmp_dir: tempfile::TempDir, #[case] start: u64, #[case] end: u64) {
        let path = tmp_dir.path().join("runs.bin");
        write_sequence(&path, 10);

        match RunCursor::open(&path, start, end) {
            Err(SortError::InvalidRun { .. }) => {}
            _ => panic!("invalid run error expected"),
        }
    }

    #[rstest]
    fn test_run_cursor_missing_file(tmp_dir: tempfile::TempDir) {
        match RunCursor::open(&tmp_dir.path().join("missing.bin"), 0, 16) {
            Err(SortError::Open { .. }) => {}
            _ => panic!("open error expected"),
        }
    }
}
