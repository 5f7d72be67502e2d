//! Replacement selection run generation.

use std::cmp;
use std::path::Path;

use log;

use crate::buffer::{BlockReader, BlockWriter, RECORDS_PER_BLOCK};
use crate::file::{count_blocks, record_file_len};
use crate::heap::MinHeap;
use crate::record::Record;
use crate::sort::SortError;

/// Splits the input file into sorted runs written to `output` using replacement selection.
/// Returns the run boundaries: ascending byte offsets of `output` starting at 0 and ending at its length.
///
/// The heap holds up to `blocks_in_ram` blocks of records. Every input record evicts the current minimum to the
/// output block buffer, a new minimum that sorts before the evicted record is frozen until the block is flushed.
/// Each flushed block therefore holds a sorted run.
///
/// # Arguments
/// * `input` - File to be split into runs
/// * `output` - File the runs are written to, truncated first
/// * `blocks_in_ram` - Number of blocks the heap may hold
pub fn replacement_selection(input: &Path, output: &Path, blocks_in_ram: usize) -> Result<Vec<u64>, SortError> {
    if blocks_in_ram == 0 {
        return Err(SortError::InvalidConfig("at least one block must fit in memory"));
    }
    let input_len = record_file_len(input)?;
    let window_blocks = cmp::min(count_blocks(input)?, blocks_in_ram as u64) as usize;
    log::info!(
        "replacement selection of {} ({} bytes, {} blocks in memory)",
        input.display(),
        input_len,
        window_blocks
    );

    let mut reader = BlockReader::open(input)?;
    let mut writer = BlockWriter::create(output)?;
    if input_len == 0 {
        writer.finish()?;
        return Ok(vec![0, 0]);
    }

    let primed = reader
        .by_ref()
        .take(window_blocks * RECORDS_PER_BLOCK)
        .collect::<Result<Vec<Record>, _>>()?;
    let capacity = primed.len();
    let mut heap = MinHeap::new(primed, capacity, capacity, Record::cmp_key);
    let mut boundaries = Vec::new();

    for record in reader {
        let evicted = heap.replace(0, record?);
        writer.push(&evicted);

        if writer.is_full() {
            boundaries.push(writer.flush()?);
            // frozen records become eligible for the next run
            heap.set_len(capacity);
            heap.build();
        } else if heap.peek_min().cmp_key(&evicted).is_lt() {
            let last = heap.len() - 1;
            heap.swap(0, last);
            heap.set_len(last);
            if last > 0 {
                heap.update(0);
            }
        }
    }

    // a trailing partial input block leaves a partial output block behind
    if writer.buffered() > 0 {
        boundaries.push(writer.flush()?);
    }

    heap.set_len(capacity);
    heap.build();
    while !heap.is_empty() {
        writer.push(&heap.remove_min());
        if writer.is_full() {
            boundaries.push(writer.flush()?);
        }
    }
    if writer.buffered() > 0 {
        boundaries.push(writer.flush()?);
    }

    boundaries.push(writer.finish()?);
    log::info!("replacement selection produced {} runs", boundaries.len() - 1);

    return Ok(boundaries);
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rstest::*;

    use super::replacement_selection;
    use crate::buffer::{BLOCK_SIZE, RECORDS_PER_BLOCK};
    use crate::file::{read_records, write_records};
    use crate::generator::{write_random_records, RandomRecords};
    use crate::record::{Record, RECORD_SIZE};
    use crate::sort::SortError;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn assert_runs_sorted(path: &Path, boundaries: &[u64]) {
        let records = read_records(path).unwrap();
        assert_eq!(boundaries.first(), Some(&0));
        assert_eq!(*boundaries.last().unwrap(), (records.len() * RECORD_SIZE) as u64);

        for run in boundaries.windows(2) {
            assert!(run[0] < run[1], "boundaries not ascending: {:?}", boundaries);
            let run_records = &records[run[0] as usize / RECORD_SIZE..run[1] as usize / RECORD_SIZE];
            for pair in run_records.windows(2) {
                assert!(!pair[1].cmp_key(&pair[0]).is_lt(), "run [{}, {}) not sorted", run[0], run[1]);
            }
        }
    }

    fn sorted_ids(records: Vec<Record>) -> Vec<i64> {
        let mut ids = Vec::from_iter(records.into_iter().map(|r| r.id()));
        ids.sort();
        ids
    }

    #[rstest]
    fn test_replacement_selection_16_blocks(tmp_dir: tempfile::TempDir) {
        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("runs.bin");
        write_random_records(&input, 16, &mut RandomRecords::new(16)).unwrap();

        let boundaries = replacement_selection(&input, &output, 8).unwrap();

        assert_eq!(
            boundaries,
            vec![
                0, 8192, 16384, 24576, 32768, 40960, 49152, 57344, 65536, 73728, 81920, 90112, 98304, 106496, 114688,
                122880, 131072
            ]
        );
        assert_runs_sorted(&output, &boundaries);
        assert_eq!(
            sorted_ids(read_records(&output).unwrap()),
            sorted_ids(read_records(&input).unwrap())
        );
    }

    #[rstest]
    #[case(1, 8)]
    #[case(3, 8)]
    #[case(8, 8)]
    #[case(9, 8)]
    #[case(20, 8)]
    #[case(5, 1)]
    #[case(7, 2)]
    fn test_replacement_selection_runs_sorted(
        tmp_dir: tempfile::TempDir,
        #[case] blocks: usize,
        #[case] blocks_in_ram: usize,
    ) {
        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("runs.bin");
        write_random_records(&input, blocks, &mut RandomRecords::new(blocks as u64)).unwrap();

        let boundaries = replacement_selection(&input, &output, blocks_in_ram).unwrap();

        assert_eq!(boundaries.len(), blocks + 1);
        assert_eq!(*boundaries.last().unwrap(), (blocks * BLOCK_SIZE) as u64);
        assert_runs_sorted(&output, &boundaries);
        assert_eq!(
            sorted_ids(read_records(&output).unwrap()),
            sorted_ids(read_records(&input).unwrap())
        );
    }

    #[rstest]
    #[case(1)]
    #[case(100)]
    #[case(RECORDS_PER_BLOCK * 9 + 100)]
    #[case(RECORDS_PER_BLOCK * 12 + 511)]
    fn test_replacement_selection_partial_block(tmp_dir: tempfile::TempDir, #[case] count: usize) {
        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("runs.bin");
        let mut keys = Vec::from_iter(0..count);
        keys.shuffle(&mut StdRng::seed_from_u64(count as u64));
        write_records(&input, keys.into_iter().map(|k| Record::new(k as i64, k as f64))).unwrap();

        let boundaries = replacement_selection(&input, &output, 8).unwrap();

        assert_runs_sorted(&output, &boundaries);
        assert_eq!(
            sorted_ids(read_records(&output).unwrap()),
            Vec::from_iter(0..count as i64)
        );
    }

    #[rstest]
    fn test_replacement_selection_presorted_input(tmp_dir: tempfile::TempDir) {
        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("runs.bin");
        let count = 10 * RECORDS_PER_BLOCK;
        write_records(&input, (0..count).map(|k| Record::new(k as i64, k as f64))).unwrap();

        let boundaries = replacement_selection(&input, &output, 8).unwrap();

        assert_runs_sorted(&output, &boundaries);
        // nothing gets frozen, the whole output is a single ascending sequence
        assert_eq!(
            Vec::from_iter(read_records(&output).unwrap().into_iter().map(|r| r.id())),
            Vec::from_iter(0..count as i64)
        );
    }

    #[rstest]
    fn test_replacement_selection_empty_input(tmp_dir: tempfile::TempDir) {
        let input = tmp_dir.path().join("input.bin");
        let output = tmp_dir.path().join("runs.bin");
        std::fs::write(&input, b"").unwrap();

        assert_eq!(replacement_selection(&input, &output, 8).unwrap(), vec![0, 0]);
        assert_eq!(std::fs::metadata(&output).unwrap().len(), 0);
    }

    #[rstest]
    fn test_replacement_selection_misaligned_input(tmp_dir: tempfile::TempDir) {
        let input = tmp_dir.path().join("input.bin");
        std::fs::write(&input, [0u8; 20]).unwrap();

        match replacement_selection(&input, &tmp_dir.path().join("runs.bin"), 8) {
            Err(SortError::Misaligned { len: 20, .. }) => {}
            _ => panic!("misaligned error expected"),
        }
    }
}
