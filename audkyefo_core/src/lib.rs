//! Split audio files into equal parts, fixed-length segments or custom ranges.
//!
//! The crate is organised leaf first:
//!
//! * [`time`] converts between `MM:SS` strings and seconds,
//! * [`naming`] renders output file names from patterns,
//! * [`segment`] turns a timeline length and a [`SplitPolicy`] into [`Segment`]s,
//! * [`split`](mod@split) exports those segments from an [`AudioSource`],
//! * [`probe`](mod@probe) reads technical attributes and tags of an input file.
//!
//! ```no_run
//! use audkyefo_core::{split_file, OutputSpec, SilentProgress, SplitPolicy};
//!
//! let output = OutputSpec::builder("parts").build()?;
//! let policy = SplitPolicy::fixed_duration(60.0);
//! let files = split_file("talk.wav", &policy, &output, &mut SilentProgress)?;
//! println!("wrote {} files", files.len());
//! # Ok::<(), audkyefo_core::SplitError>(())
//! ```

use std::path::{Path, PathBuf};

pub mod audio;
pub mod error;
pub mod naming;
pub mod output;
pub mod probe;
pub mod progress;
pub mod segment;
pub mod split;
pub mod time;

pub use audio::{AudioSource, DecodedAudio};
pub use error::{ExportFailure, SplitError};
pub use naming::{render, validate_naming_pattern, DEFAULT_NAMING_PATTERN};
pub use output::{OutputFormat, OutputSpec, OutputSpecBuilder, Quality};
pub use probe::{human_readable_size, probe, AudioMetadata, SUPPORTED_INPUT_FORMATS};
pub use progress::{Flow, ProgressEvent, ProgressReporter, SilentProgress};
pub use segment::{compute_segments, Segment, SplitMethod, SplitPolicy, TimeRange, MAX_SEGMENTS};
pub use split::{plan, split, PlannedSegment};
pub use time::{format_time, parse_time, seconds_to_ms, validate_time_range};

/// Decode the file at `input` and split it.
///
/// Shorthand for [`DecodedAudio::open`] followed by [`split()`].
pub fn split_file<P: AsRef<Path>>(
    input: P,
    policy: &SplitPolicy,
    output: &OutputSpec,
    reporter: &mut dyn ProgressReporter,
) -> Result<Vec<PathBuf>, SplitError> {
    let audio = DecodedAudio::open(input)?;
    split(Some(&audio), policy, output, reporter)
}
