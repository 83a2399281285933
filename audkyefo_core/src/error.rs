use std::path::PathBuf;

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

use crate::output::OutputFormat;

/// Errors that can occur while validating, planning or splitting audio files.
///
/// Every variant renders as a sentence that can be shown to a user as-is.
#[derive(Debug, Error)]
pub enum SplitError {
    /// A time string did not have the `MM:SS` shape.
    #[error("invalid time format '{input}', expected MM:SS")]
    InvalidFormat { input: String },

    /// A splitting parameter violates its precondition.
    #[error("{0}")]
    InvalidParameter(String),

    /// The start of a time range is not before its end.
    #[error("start time must be less than end time")]
    OrderingViolation,

    /// A time range lies (partly) outside the audio timeline.
    #[error("{0}")]
    OutOfBounds(String),

    #[error("naming pattern cannot be empty")]
    EmptyPattern,

    #[error("naming pattern must include {{original_name}}")]
    MissingOriginalNameVar,

    #[error("naming pattern must include at least one of: {{number}}, {{start_time}}, {{end_time}}")]
    MissingIndexOrTimeVar,

    #[error("naming pattern contains characters that are not allowed in file names")]
    InvalidCharacters,

    /// The naming pattern could not be rendered into a file name.
    #[error("invalid naming pattern: {0}")]
    TemplateError(String),

    /// A split was requested before any audio was loaded.
    #[error("no audio file loaded")]
    NoAudioLoaded,

    /// The requested output format is unknown or cannot be produced by the audio source.
    #[error("unsupported output format '{0}'")]
    UnsupportedFormat(String),

    /// The input file is not a recognised audio file.
    #[error("unsupported audio file: {}", .0.display())]
    UnsupportedInput(PathBuf),

    /// The output directory cannot be created or written to.
    #[error("{reason}: {}", .path.display())]
    DirectoryError { path: PathBuf, reason: String },

    /// The naming pattern renders the same file name for two segments.
    #[error(
        "segments {first} and {second} would both be written to {}; add {{number}} to the naming pattern",
        .path.display()
    )]
    DuplicateOutputName {
        first: usize,
        second: usize,
        path: PathBuf,
    },

    /// A target file already exists and overwriting was not requested.
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Writing one segment failed; the remaining segments were not written.
    #[error("failed to export segment {index} to {}: {source}", .path.display())]
    ExportError {
        index: usize,
        path: PathBuf,
        #[source]
        source: ExportFailure,
    },

    /// The progress reporter asked to stop between two segments.
    #[error("split cancelled after {completed} segment(s)")]
    Cancelled { completed: usize },

    /// The policy would produce more files than the splitter is willing to write.
    #[error("splitting would produce more than {limit} segments")]
    SegmentLimitExceeded { limit: usize },

    /// Wrapper around errors produced by the Symphonia decoding library.
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),

    /// Wrapper around IO errors encountered while reading input files.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error returned when the decoder track lacks a sample rate.
    #[error("input stream does not advertise a sample rate")]
    MissingSampleRate,

    /// Error returned when the container does not expose any default track.
    #[error("input stream does not provide a default track")]
    MissingDefaultTrack,

    /// Error returned when the codec of the track cannot be handled.
    #[error("unsupported codec")]
    UnsupportedCodec,
}

/// Failure reported by an [`AudioSource`](crate::AudioSource) while writing a single slice.
#[derive(Debug, Error)]
pub enum ExportFailure {
    #[error(transparent)]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0} output cannot be written by this audio source")]
    UnsupportedFormat(OutputFormat),

    #[error("{0}")]
    Other(String),
}
