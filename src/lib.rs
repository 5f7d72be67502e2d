//! `record-sort` is an external sort of binary record files.
//!
//! External sorting is a class of sorting algorithms that can handle massive amounts of data. External sorting
//! is required when the data being sorted do not fit into the main memory (RAM) of a computer and instead must be
//! resided in slower external memory, usually a hard disk drive. Sorting is achieved in two phases. During the
//! first phase replacement selection streams the file through a bounded in-memory heap producing sorted runs,
//! during the second phase the runs are merged together, a bounded number of runs at a time, until a single run
//! is left. For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! * **Record format:**
//!   a record is 16 bytes: a big-endian `i64` id followed by a big-endian `f64` key. Records are ordered by key only.
//! * **Block I/O:**
//!   files are read and written in blocks of 512 records (8192 bytes), only the last block may be partial.
//! * **Bounded memory:**
//!   run generation holds at most 8 blocks in memory and the merge keeps one block buffer per merged run,
//!   at most 8 runs at a time. Both limits are configurable.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use record_sort::{ExternalSorter, ExternalSorterBuilder};
//!
//! fn main() {
//!     let sorter: ExternalSorter = ExternalSorterBuilder::new()
//!         .with_tmp_dir(Path::new("./"))
//!         .with_blocks_in_ram(8)
//!         .with_fan_in(8)
//!         .build()
//!         .unwrap();
//!
//!     let stats = sorter.sort(Path::new("input.bin")).unwrap();
//!     println!("{} records sorted in {} merge passes", stats.records, stats.passes);
//! }
//! ```

pub mod buffer;
pub mod file;
pub mod generator;
pub mod heap;
pub mod merger;
pub mod print;
pub mod record;
pub mod run;
pub mod selection;
pub mod sort;

pub use buffer::{BlockReader, BlockWriter, BLOCK_SIZE, RECORDS_PER_BLOCK};
pub use generator::{RandomRecords, RecordSource};
pub use heap::MinHeap;
pub use merger::{merge_pass, multiway_merge};
pub use record::{Record, RECORD_SIZE};
pub use run::RunCursor;
pub use selection::replacement_selection;
pub use sort::{ExternalSorter, ExternalSorterBuilder, SortError, SortStats};
