//! Random record generation.

use std::path::Path;

use log;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buffer::RECORDS_PER_BLOCK;
use crate::file::write_records;
use crate::record::Record;
use crate::sort::SortError;

/// Record source interface.
pub trait RecordSource {
    /// Produces the next record.
    fn next_record(&mut self) -> Record;
}

/// Pseudorandom record source. The same seed always produces the same record sequence.
pub struct RandomRecords {
    rng: StdRng,
}

impl RandomRecords {
    pub fn new(seed: u64) -> Self {
        RandomRecords {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RecordSource for RandomRecords {
    /// Returns a record with a random id and a random key from `[0, 1)`.
    fn next_record(&mut self) -> Record {
        Record::new(self.rng.gen::<i64>(), self.rng.gen::<f64>())
    }
}

/// Fills a file with `blocks` blocks of records taken from `source`, the file is truncated first.
pub fn write_random_records<S: RecordSource>(path: &Path, blocks: usize, source: &mut S) -> Result<u64, SortError> {
    log::info!("writing {} blocks of random records to {}", blocks, path.display());
    write_records(path, (0..blocks * RECORDS_PER_BLOCK).map(|_| source.next_record()))
}
