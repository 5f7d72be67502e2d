//! External sorter.

use log;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use crate::file::{copy_file, record_file_len};
use crate::merger::{merge_pass, multiway_merge};
use crate::record::RECORD_SIZE;
use crate::selection::replacement_selection;

/// Default number of blocks held in memory by replacement selection.
pub const DEFAULT_BLOCKS_IN_RAM: usize = 8;

/// Default number of runs merged at once.
pub const DEFAULT_FAN_IN: usize = 8;

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Temporary directory or file creation error.
    TempDir(io::Error),
    /// Common I/O error.
    IO(io::Error),
    /// File opening or creation error.
    Open { path: PathBuf, err: io::Error },
    /// File read error.
    Read { path: PathBuf, offset: u64, err: io::Error },
    /// File write error.
    Write { path: PathBuf, offset: u64, err: io::Error },
    /// File length is not a multiple of the record size.
    Misaligned { path: PathBuf, len: u64 },
    /// Run boundaries are not consistent with the file.
    InvalidRun { start: u64, end: u64 },
    /// Sorter configuration error.
    InvalidConfig(&'static str),
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::TempDir(err) => Some(err),
            SortError::IO(err) => Some(err),
            SortError::Open { err, .. } => Some(err),
            SortError::Read { err, .. } => Some(err),
            SortError::Write { err, .. } => Some(err),
            SortError::Misaligned { .. } => None,
            SortError::InvalidRun { .. } => None,
            SortError::InvalidConfig(_) => None,
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::TempDir(err) => write!(f, "temporary directory or file not created: {}", err),
            SortError::IO(err) => write!(f, "I/O operation failed: {}", err),
            SortError::Open { path, err } => write!(f, "{} opening failed: {}", path.display(), err),
            SortError::Read { path, offset, err } => {
                write!(f, "{} reading at offset {} failed: {}", path.display(), offset, err)
            }
            SortError::Write { path, offset, err } => {
                write!(f, "{} writing at offset {} failed: {}", path.display(), offset, err)
            }
            SortError::Misaligned { path, len } => write!(
                f,
                "{} length {} is not a multiple of the record size {}",
                path.display(),
                len,
                RECORD_SIZE
            ),
            SortError::InvalidRun { start, end } => write!(f, "invalid run [{}, {})", start, end),
            SortError::InvalidConfig(msg) => write!(f, "invalid sorter configuration: {}", msg),
        }
    }
}

/// Sorting summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortStats {
    /// Number of sorted records.
    pub records: u64,
    /// Number of runs produced by replacement selection.
    pub runs: usize,
    /// Number of merge passes.
    pub passes: usize,
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder {
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Number of blocks held in memory by replacement selection.
    blocks_in_ram: usize,
    /// Maximum number of runs merged at once.
    fan_in: usize,
}

impl ExternalSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter, SortError> {
        ExternalSorter::new(self.tmp_dir.as_deref(), self.blocks_in_ram, self.fan_in)
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets number of blocks held in memory while runs are generated.
    pub fn with_blocks_in_ram(mut self, blocks_in_ram: usize) -> ExternalSorterBuilder {
        self.blocks_in_ram = blocks_in_ram;
        return self;
    }

    /// Sets maximum number of runs merged at once.
    pub fn with_fan_in(mut self, fan_in: usize) -> ExternalSorterBuilder {
        self.fan_in = fan_in;
        return self;
    }
}

impl Default for ExternalSorterBuilder {
    fn default() -> Self {
        ExternalSorterBuilder {
            tmp_dir: None,
            blocks_in_ram: DEFAULT_BLOCKS_IN_RAM,
            fan_in: DEFAULT_FAN_IN,
        }
    }
}

/// External sorter of record files.
pub struct ExternalSorter {
    /// Directory to be used to store temporary data.
    tmp_dir: tempfile::TempDir,
    /// Number of blocks held in memory by replacement selection.
    blocks_in_ram: usize,
    /// Maximum number of runs merged at once.
    fan_in: usize,
}

impl ExternalSorter {
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `tmp_path` - Directory to be used to store temporary data. If paramater is [`None`] default OS temporary
    ///   directory will be used.
    /// * `blocks_in_ram` - Number of blocks held in memory by replacement selection, at least 1.
    /// * `fan_in` - Maximum number of runs merged at once, at least 2.
    pub fn new(tmp_path: Option<&Path>, blocks_in_ram: usize, fan_in: usize) -> Result<Self, SortError> {
        if blocks_in_ram == 0 {
            return Err(SortError::InvalidConfig("at least one block must fit in memory"));
        }
        if fan_in < 2 {
            return Err(SortError::InvalidConfig("fan-in must be at least 2"));
        }

        return Ok(ExternalSorter {
            tmp_dir: Self::init_tmp_directory(tmp_path)?,
            blocks_in_ram,
            fan_in,
        });
    }

    fn init_tmp_directory(tmp_path: Option<&Path>) -> Result<tempfile::TempDir, SortError> {
        let tmp_dir = if let Some(tmp_path) = tmp_path {
            tempfile::tempdir_in(tmp_path)
        } else {
            tempfile::tempdir()
        }
        .map_err(|err| SortError::TempDir(err))?;

        log::info!("using {} as a temporary directory", tmp_dir.path().display());

        return Ok(tmp_dir);
    }

    /// Sorts a record file in place.
    ///
    /// Runs are generated into a scratch file of the temporary directory, merged there and the result is copied
    /// back over `path`.
    pub fn sort(&self, path: &Path) -> Result<SortStats, SortError> {
        let records = record_file_len(path)? / RECORD_SIZE as u64;
        let runs_path = self.tmp_dir.path().join("runs.bin");
        let merge_path = self.tmp_dir.path().join("merge.bin");

        let boundaries = self.replacement_selection(path, &runs_path)?;
        let passes = self.multiway_merge(&boundaries, &runs_path, &merge_path)?;
        copy_file(&runs_path, path)?;

        let stats = SortStats {
            records,
            runs: boundaries.len() - 1,
            passes,
        };
        log::info!(
            "{} sorted: {} records, {} runs, {} merge passes",
            path.display(),
            stats.records,
            stats.runs,
            stats.passes
        );

        return Ok(stats);
    }

    /// Splits `input` into sorted runs written to `output`. Returns the run boundaries of `output`.
    pub fn replacement_selection(&self, input: &Path, output: &Path) -> Result<Vec<u64>, SortError> {
        replacement_selection(input, output, self.blocks_in_ram)
    }

    /// Runs a single merge pass from `input` into `output`. Returns the run boundaries of `output`.
    pub fn merge_pass(&self, boundaries: &[u64], input: &Path, output: &Path) -> Result<Vec<u64>, SortError> {
        merge_pass(boundaries, input, output, self.fan_in)
    }

    /// Merges runs of `file` into a single run, `scratch` is used as the second pass file.
    /// Returns the number of merge passes.
    pub fn multiway_merge(&self, boundaries: &[u64], file: &Path, scratch: &Path) -> Result<usize, SortError> {
        multiway_merge(boundaries, file, scratch, self.fan_in)
    }
}
