mod duration;

use std::path::PathBuf;

use audkyefo_core::{OutputFormat, Quality, SplitPolicy, TimeRange, DEFAULT_NAMING_PATTERN};
use clap::{builder::ValueParser, value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};

use duration::parse_length;

fn parse_range(value: &str) -> Result<TimeRange, String> {
    value.parse::<TimeRange>().map_err(|err| err.to_string())
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    value.parse::<OutputFormat>().map_err(|err| err.to_string())
}

fn parse_quality(value: &str) -> Result<Quality, String> {
    value.parse::<Quality>().map_err(|err| err.to_string())
}

fn parse_overlap(value: &str) -> Result<f64, String> {
    match value.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(format!("invalid overlap '{value}': expected seconds >= 0")),
    }
}

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .about("Split audio files into equal parts, fixed-length segments or custom ranges")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("parts")
                .short('n')
                .long("parts")
                .value_name("N")
                .help("Split into N parts of equal length")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("length")
                .short('l')
                .long("length")
                .value_name("DURATION")
                .help("Length of each segment (e.g. 90s, 1m30s, 1.5m, 500ms or 01:30)")
                .value_parser(ValueParser::new(parse_length)),
        )
        .arg(
            Arg::new("range")
                .short('r')
                .long("range")
                .value_name("MM:SS-MM:SS")
                .help("Extract a time range; repeat for several ranges")
                .action(ArgAction::Append)
                .value_parser(ValueParser::new(parse_range)),
        )
        .group(
            ArgGroup::new("method")
                .args(["parts", "length", "range"])
                .multiple(false),
        )
        .arg(
            Arg::new("overlap")
                .long("overlap")
                .value_name("SECONDS")
                .help("Seconds shared by neighbouring segments")
                .default_value("0")
                .value_parser(ValueParser::new(parse_overlap)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("Directory where the segments will be written")
                .default_value(".")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format (mp3, wav, aac, ogg, m4a, flac)")
                .default_value("wav")
                .value_parser(ValueParser::new(parse_format)),
        )
        .arg(
            Arg::new("pattern")
                .short('p')
                .long("pattern")
                .value_name("PATTERN")
                .help("File name pattern using {original_name}, {number}, {start_time} and {end_time}")
                .default_value(DEFAULT_NAMING_PATTERN),
        )
        .arg(
            Arg::new("quality")
                .short('q')
                .long("quality")
                .value_name("QUALITY")
                .help("Output quality (low, medium, high)")
                .default_value("medium")
                .value_parser(ValueParser::new(parse_quality)),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Allow overwriting existing files in the output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the generated segments without writing files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("info")
                .long("info")
                .help("Print information about the input file and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("file_path")
                .value_name("FILE_PATH")
                .help("Path to the input audio file")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}

/// The split policy selected on the command line, if any.
pub fn split_policy(matches: &ArgMatches) -> Option<SplitPolicy> {
    let policy = if let Some(parts) = matches.get_one::<usize>("parts") {
        SplitPolicy::equal_parts(*parts)
    } else if let Some(seconds) = matches.get_one::<f64>("length") {
        SplitPolicy::fixed_duration(*seconds)
    } else if let Some(ranges) = matches.get_many::<TimeRange>("range") {
        SplitPolicy::custom_ranges(ranges.copied())
    } else {
        return None;
    };

    let overlap = matches.get_one::<f64>("overlap").copied().unwrap_or_default();
    Some(policy.with_overlap(overlap))
}
