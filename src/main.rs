use std::fs;
use std::io;
use std::path;
use std::process;

use bytesize::ByteSize;
use clap::ArgEnum;
use env_logger;
use log;

use record_sort::generator::write_random_records;
use record_sort::print::{write_first_records_of_blocks, write_records};
use record_sort::{ExternalSorter, ExternalSorterBuilder, RandomRecords};

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let tmp_dir: Option<&str> = arg_parser.value_of("tmp_dir");
    let blocks_in_ram: usize = arg_parser.value_of_t_or_exit("blocks_in_ram");
    let fan_in: usize = arg_parser.value_of_t_or_exit("fan_in");
    let first_of_blocks = arg_parser.is_present("first_of_blocks");

    let file = path::Path::new(arg_parser.value_of("file").expect("value is required"));

    if arg_parser.is_present("generate") {
        let blocks: usize = arg_parser.value_of_t_or_exit("generate");
        let seed: u64 = arg_parser.value_of_t_or_exit("seed");
        if let Err(err) = write_random_records(file, blocks, &mut RandomRecords::new(seed)) {
            log::error!("random records generation error: {}", err);
            process::exit(1);
        }
    }

    let mut sorter_builder = ExternalSorterBuilder::new()
        .with_blocks_in_ram(blocks_in_ram)
        .with_fan_in(fan_in);

    if let Some(tmp_dir) = tmp_dir {
        sorter_builder = sorter_builder.with_tmp_dir(path::Path::new(tmp_dir));
    }

    let sorter: ExternalSorter = match sorter_builder.build() {
        Ok(sorter) => sorter,
        Err(err) => {
            log::error!("sorter initialization error: {}", err);
            process::exit(1);
        }
    };

    if let Ok(metadata) = fs::metadata(file) {
        log::info!("sorting {} ({})", file.display(), ByteSize::b(metadata.len()));
    }

    if let Err(err) = sorter.sort(file) {
        log::error!("data sorting error: {}", err);
        process::exit(1);
    }

    let stdout = io::stdout();
    let mut output_stream = io::BufWriter::new(stdout.lock());
    let printed = if first_of_blocks {
        write_first_records_of_blocks(file, &mut output_stream)
    } else {
        write_records(file, &mut output_stream)
    };

    if let Err(err) = printed {
        log::error!("data printing error: {}", err);
        process::exit(1);
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ArgEnum>::from_str(s, false)
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("record-sort")
        .about("external sorter of binary record files")
        .arg(
            clap::Arg::new("file")
                .help("record file to be sorted in place")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("blocks_in_ram")
                .short('b')
                .long("blocks-in-ram")
                .help("number of blocks held in memory while generating runs")
                .takes_value(true)
                .default_value("8"),
        )
        .arg(
            clap::Arg::new("fan_in")
                .short('f')
                .long("fan-in")
                .help("maximum number of runs merged at once")
                .takes_value(true)
                .default_value("8"),
        )
        .arg(
            clap::Arg::new("first_of_blocks")
                .long("first-of-blocks")
                .help("print only the first record of every block"),
        )
        .arg(
            clap::Arg::new("generate")
                .short('g')
                .long("generate")
                .help("fill the file with the given number of blocks of random records before sorting")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("seed")
                .short('s')
                .long("seed")
                .help("random records generator seed")
                .takes_value(true)
                .default_value("0"),
        )
        .get_matches()
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}
