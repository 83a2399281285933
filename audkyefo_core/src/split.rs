//! Runs a split: computes the windows, names them and exports them in order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::audio::AudioSource;
use crate::error::SplitError;
use crate::naming::{render, validate_naming_pattern};
use crate::output::{OutputFormat, OutputSpec};
use crate::progress::{
    splitting_percent, Flow, ProgressEvent, ProgressReporter, PROGRESS_ANALYSIS,
    PROGRESS_COMPLETE, PROGRESS_SPLITTING_START,
};
use crate::segment::{compute_segments, Segment, SplitMethod, SplitPolicy};

/// A segment together with the file it will be written to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedSegment {
    pub segment: Segment,
    pub path: PathBuf,
}

fn ensure_supported<A>(audio: &A, format: OutputFormat) -> Result<(), SplitError>
where
    A: AudioSource + ?Sized,
{
    if audio.supported_formats().contains(&format) {
        Ok(())
    } else {
        Err(SplitError::UnsupportedFormat(format.to_string()))
    }
}

/// Create `dir` if needed and make sure files can be written into it.
///
/// Returns the canonical form of the directory.
fn prepare_output_dir(dir: &Path) -> Result<PathBuf, SplitError> {
    let directory_error = |reason: String| SplitError::DirectoryError {
        path: dir.to_path_buf(),
        reason,
    };

    if dir.as_os_str().is_empty() {
        return Err(directory_error("output directory cannot be empty".into()));
    }
    if dir.exists() && !dir.is_dir() {
        return Err(directory_error("output path is not a directory".into()));
    }

    fs::create_dir_all(dir)
        .map_err(|err| directory_error(format!("cannot create output directory ({err})")))?;
    tempfile::Builder::new()
        .prefix(".audkyefo-")
        .tempfile_in(dir)
        .map_err(|_| directory_error("output directory is not writable".into()))?;

    fs::canonicalize(dir)
        .map_err(|err| directory_error(format!("cannot resolve output directory ({err})")))
}

fn name_segments<A>(
    audio: &A,
    segments: &[Segment],
    output: &OutputSpec,
    dir: &Path,
) -> Result<Vec<PlannedSegment>, SplitError>
where
    A: AudioSource + ?Sized,
{
    let mut claimed: HashMap<PathBuf, usize> = HashMap::with_capacity(segments.len());
    let mut planned = Vec::with_capacity(segments.len());

    for segment in segments {
        let file_name = render(
            audio.file_name(),
            segment.index,
            Some(segment.start_seconds()),
            Some(segment.end_seconds()),
            &output.naming_pattern,
            output.format.extension(),
        )?;
        let path = dir.join(file_name);
        if let Some(&first) = claimed.get(&path) {
            return Err(SplitError::DuplicateOutputName {
                first,
                second: segment.index,
                path,
            });
        }
        claimed.insert(path.clone(), segment.index);
        planned.push(PlannedSegment {
            segment: *segment,
            path,
        });
    }

    Ok(planned)
}

/// Work out which files a split would write, without touching the filesystem.
pub fn plan<A>(
    audio: Option<&A>,
    policy: &SplitPolicy,
    output: &OutputSpec,
) -> Result<Vec<PlannedSegment>, SplitError>
where
    A: AudioSource + ?Sized,
{
    let audio = audio.ok_or(SplitError::NoAudioLoaded)?;
    ensure_supported(audio, output.format)?;
    validate_naming_pattern(&output.naming_pattern)?;

    let segments = compute_segments(audio.duration_ms(), policy)?;
    name_segments(audio, &segments, output, &output.output_dir)
}

/// Split `audio` according to `policy` and write the segments described by `output`.
///
/// Segments are exported one at a time in index order. Before each export a
/// [`ProgressEvent`] is sent to `reporter`; answering it with [`Flow::Cancel`]
/// stops the split with [`SplitError::Cancelled`], keeping the files written so
/// far. A failed export aborts the split with [`SplitError::ExportError`].
/// Files written before the failure are left on disk.
///
/// Returns the absolute paths of the written files in index order.
pub fn split<A>(
    audio: Option<&A>,
    policy: &SplitPolicy,
    output: &OutputSpec,
    reporter: &mut dyn ProgressReporter,
) -> Result<Vec<PathBuf>, SplitError>
where
    A: AudioSource + ?Sized,
{
    let audio = audio.ok_or(SplitError::NoAudioLoaded)?;
    ensure_supported(audio, output.format)?;
    validate_naming_pattern(&output.naming_pattern)?;

    reporter.report(&ProgressEvent::new(PROGRESS_ANALYSIS, "Analyzing audio..."));
    // Nothing is created on disk until the policy is known to be valid.
    let segments = compute_segments(audio.duration_ms(), policy)?;
    let output_dir = prepare_output_dir(&output.output_dir)?;
    let planned = name_segments(audio, &segments, output, &output_dir)?;

    if !output.overwrite {
        if let Some(existing) = planned.iter().find(|entry| entry.path.exists()) {
            return Err(SplitError::OutputExists(existing.path.clone()));
        }
    }

    info!(
        "splitting '{}' into {} segment(s) using {}",
        audio.file_name(),
        planned.len(),
        policy.method.name()
    );
    reporter.report(&ProgressEvent::new(
        PROGRESS_SPLITTING_START,
        format!("Splitting audio using {} method...", policy.method.name()),
    ));

    // Custom ranges keep their position in the input list, so count against it.
    let (noun, of) = match &policy.method {
        SplitMethod::CustomRanges { ranges } => ("segment", ranges.len()),
        _ => ("part", planned.len()),
    };

    let total = planned.len();
    let mut written = Vec::with_capacity(total);
    for (position, entry) in planned.into_iter().enumerate() {
        let segment = entry.segment;
        let event = ProgressEvent::new(
            splitting_percent(position, total),
            format!("Creating {noun} {} of {of}...", segment.index),
        );
        if reporter.report(&event) == Flow::Cancel {
            info!("split cancelled after {} segment(s)", written.len());
            return Err(SplitError::Cancelled {
                completed: written.len(),
            });
        }

        debug!(
            "exporting segment {} [{} ms, {} ms) to '{}'",
            segment.index,
            segment.start_ms,
            segment.end_ms,
            entry.path.display()
        );
        audio
            .export_slice(
                segment.start_ms,
                segment.end_ms,
                &entry.path,
                output.format,
                output.quality,
            )
            .map_err(|source| SplitError::ExportError {
                index: segment.index,
                path: entry.path.clone(),
                source,
            })?;
        written.push(entry.path);
    }

    reporter.report(&ProgressEvent::new(
        PROGRESS_COMPLETE,
        format!("Splitting complete. Created {} files.", written.len()),
    ));
    Ok(written)
}
