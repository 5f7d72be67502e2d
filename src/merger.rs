//! Multiway run merger.

use std::cmp;
use std::mem;
use std::path::Path;

use log;

use crate::buffer::BlockWriter;
use crate::file::{copy_file, record_file_len};
use crate::heap::MinHeap;
use crate::record::RECORD_SIZE;
use crate::run::RunCursor;
use crate::sort::SortError;

/// Merges runs of `file` until a single run is left, the sorted data ends up in `file`.
/// Passes alternate between `file` and `scratch`. Returns the number of merge passes performed.
///
/// Every pass merges groups of up to `fan_in` consecutive runs, so the run count shrinks by a factor of up to
/// `fan_in` per pass. A boundary list of two elements is already a single run and leaves `file` untouched.
///
/// # Arguments
/// * `boundaries` - Run boundaries of `file`
/// * `file` - File holding the runs
/// * `scratch` - Second file to be used by merge passes
/// * `fan_in` - Maximum number of runs merged at once
pub fn multiway_merge(boundaries: &[u64], file: &Path, scratch: &Path, fan_in: usize) -> Result<usize, SortError> {
    validate_boundaries(boundaries, record_file_len(file)?)?;

    let mut boundaries = boundaries.to_vec();
    let mut input = file;
    let mut output = scratch;
    let mut passes = 0;

    while boundaries.len() > 2 {
        log::info!("merge pass {}: {} runs", passes + 1, boundaries.len() - 1);
        boundaries = merge_pass(&boundaries, input, output, fan_in)?;
        mem::swap(&mut input, &mut output);
        passes += 1;
    }

    if input != file {
        copy_file(input, file)?;
    }
    log::info!("merge done in {} passes", passes);

    return Ok(passes);
}

/// Runs a single merge pass: groups of up to `fan_in` consecutive runs of `input` are merged into single runs
/// written to `output`. Returns the run boundaries of `output`.
pub fn merge_pass(boundaries: &[u64], input: &Path, output: &Path, fan_in: usize) -> Result<Vec<u64>, SortError> {
    if fan_in < 2 {
        return Err(SortError::InvalidConfig("fan-in must be at least 2"));
    }
    validate_boundaries(boundaries, record_file_len(input)?)?;

    let runs = boundaries.len() - 1;
    let mut writer = BlockWriter::create(output)?;
    let mut next_boundaries = Vec::with_capacity(runs / fan_in + 2);
    next_boundaries.push(0);

    for group_start in (0..runs).step_by(fan_in) {
        let group_end = cmp::min(group_start + fan_in, runs);
        merge_group(&boundaries[group_start..=group_end], input, &mut writer, fan_in)?;
        // the output buffer is shared between groups, so the boundary may fall mid-block
        next_boundaries.push(writer.position());
    }
    writer.finish()?;

    return Ok(next_boundaries);
}

fn merge_group(boundaries: &[u64], input: &Path, writer: &mut BlockWriter, fan_in: usize) -> Result<(), SortError> {
    log::debug!(
        "merging {} runs [{}, {})",
        boundaries.len() - 1,
        boundaries[0],
        boundaries[boundaries.len() - 1]
    );

    let mut cursors = MinHeap::with_capacity(fan_in, RunCursor::cmp_current);
    for run in boundaries.windows(2) {
        if run[0] < run[1] {
            cursors.insert(RunCursor::open(input, run[0], run[1])?);
        }
    }

    while !cursors.is_empty() {
        writer.push(cursors.peek_min().current());
        if writer.is_full() {
            writer.flush()?;
        }

        if cursors.get_mut(0).advance()? {
            cursors.update(0);
        } else {
            cursors.remove_min().close();
        }
    }

    Ok(())
}

/// Checks that the boundaries start at 0, end at the file length, are strictly ascending and fall on record
/// edges. The only list allowed to hold an empty run is `[0, 0]` of an empty file.
fn validate_boundaries(boundaries: &[u64], file_len: u64) -> Result<(), SortError> {
    let (first, last) = match (boundaries.first(), boundaries.last()) {
        (Some(&first), Some(&last)) if boundaries.len() >= 2 => (first, last),
        _ => return Err(SortError::InvalidRun { start: 0, end: file_len }),
    };
    if first != 0 || last != file_len {
        return Err(SortError::InvalidRun { start: first, end: last });
    }
    if boundaries == [0, 0] {
        return Ok(());
    }
    if let Some(run) = boundaries
        .windows(2)
        .find(|run| run[0] >= run[1] || run[1] % RECORD_SIZE as u64 != 0)
    {
        return Err(SortError::InvalidRun {
            start: run[0],
            end: run[1],
        });
    }

    Ok(())
}
