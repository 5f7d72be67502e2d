use std::io::{self, prelude::*};
use std::path;

use bytesize::ByteSize;
use env_logger;
use log;

use record_sort::print::write_first_records_of_blocks;
use record_sort::{generator::write_random_records, ExternalSorter, ExternalSorterBuilder, RandomRecords};

fn main() {
    env_logger::Builder::new().filter_level(log::LevelFilter::Debug).init();

    let input = path::Path::new("input.bin");
    let written = write_random_records(input, 64, &mut RandomRecords::new(42)).unwrap();
    log::info!("generated {}", ByteSize::b(written));

    let sorter: ExternalSorter = ExternalSorterBuilder::new()
        .with_tmp_dir(path::Path::new("./"))
        .build()
        .unwrap();

    let stats = sorter.sort(input).unwrap();
    log::info!("{} runs merged in {} passes", stats.runs, stats.passes);

    let mut output = io::BufWriter::new(io::stdout());
    write_first_records_of_blocks(input, &mut output).unwrap();
    output.flush().unwrap();
}
