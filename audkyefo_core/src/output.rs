use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::SplitError;
use crate::naming::{validate_naming_pattern, DEFAULT_NAMING_PATTERN};

/// Container formats a split can be written as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Mp3,
    Wav,
    Aac,
    Ogg,
    M4a,
    Flac,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Mp3,
        OutputFormat::Wav,
        OutputFormat::Aac,
        OutputFormat::Ogg,
        OutputFormat::M4a,
        OutputFormat::Flac,
    ];

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
            OutputFormat::Aac => "aac",
            OutputFormat::Ogg => "ogg",
            OutputFormat::M4a => "m4a",
            OutputFormat::Flac => "flac",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = SplitError;

    /// Parses an extension such as `wav`, `.WAV` or `flac`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().trim_start_matches('.');
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SplitError::UnsupportedFormat(value.to_owned()))
    }
}

/// Advisory export quality. How it maps to encoder settings depends on the format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        })
    }
}

impl FromStr for Quality {
    type Err = SplitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            _ => Err(SplitError::InvalidParameter(format!(
                "unknown quality '{value}', expected low, medium or high"
            ))),
        }
    }
}

/// Where and how the segments of a split are written.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSpec {
    /// Directory receiving the segment files. Created when missing.
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    /// Naming pattern, see [`crate::naming`].
    pub naming_pattern: String,
    pub quality: Quality,
    /// Replace files that already exist instead of refusing to start.
    pub overwrite: bool,
}

impl OutputSpec {
    /// Start building an [`OutputSpec`] that writes WAV files with the default
    /// naming pattern into `output_dir`.
    pub fn builder<P: Into<PathBuf>>(output_dir: P) -> OutputSpecBuilder {
        OutputSpecBuilder {
            output_dir: output_dir.into(),
            format: OutputFormat::Wav,
            naming_pattern: DEFAULT_NAMING_PATTERN.to_owned(),
            quality: Quality::default(),
            overwrite: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OutputSpecBuilder {
    output_dir: PathBuf,
    format: OutputFormat,
    naming_pattern: String,
    quality: Quality,
    overwrite: bool,
}

impl OutputSpecBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn naming_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.naming_pattern = pattern.into();
        self
    }

    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Validate the naming pattern and output directory path.
    pub fn build(self) -> Result<OutputSpec, SplitError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(SplitError::DirectoryError {
                path: self.output_dir,
                reason: "output directory cannot be empty".to_owned(),
            });
        }
        validate_naming_pattern(&self.naming_pattern)?;

        Ok(OutputSpec {
            output_dir: self.output_dir,
            format: self.format,
            naming_pattern: self.naming_pattern,
            quality: self.quality,
            overwrite: self.overwrite,
        })
    }
}
