//! Technical attributes and tags of an audio file, read without decoding it.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use symphonia::core::meta::{MetadataRevision, StandardTagKey};
use symphonia::core::probe::ProbeResult;

use crate::audio::open_reader;
use crate::error::SplitError;

/// Extensions accepted as input.
pub const SUPPORTED_INPUT_FORMATS: [&str; 6] = ["mp3", "wav", "aac", "ogg", "m4a", "flac"];

/// What [`probe`] found out about a file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioMetadata {
    pub file_name: String,
    pub path: PathBuf,
    /// Lowercased extension.
    pub format: String,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: Option<u32>,
    /// `None` when the container does not record its length.
    pub duration_seconds: Option<f64>,
    pub size_bytes: u64,
    pub size_human: String,
    /// Average bitrate in bits per second, derived from size and duration.
    pub bitrate: Option<u64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

/// Read the attributes of the audio file at `path`.
pub fn probe<P: AsRef<Path>>(path: P) -> Result<AudioMetadata, SplitError> {
    let path = path.as_ref();
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let size_bytes = fs::metadata(path)?.len();
    if !SUPPORTED_INPUT_FORMATS.contains(&format.as_str()) {
        return Err(SplitError::UnsupportedInput(path.to_path_buf()));
    }

    let mut probed = open_reader(path)?;
    let track = probed
        .format
        .default_track()
        .ok_or(SplitError::MissingDefaultTrack)?;
    let params = &track.codec_params;
    let sample_rate = params.sample_rate.ok_or(SplitError::MissingSampleRate)?;
    let channels = params.channels.map_or(0, |c| c.count() as u16);
    let bits_per_sample = params.bits_per_sample.or(params.bits_per_coded_sample);
    let duration_seconds = params
        .n_frames
        .map(|frames| frames as f64 / f64::from(sample_rate));
    let bitrate = duration_seconds
        .filter(|seconds| *seconds > 0.0)
        .map(|seconds| (size_bytes as f64 * 8.0 / seconds).round() as u64);

    let mut metadata = AudioMetadata {
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        format,
        channels,
        sample_rate,
        bits_per_sample,
        duration_seconds,
        size_bytes,
        size_human: human_readable_size(size_bytes),
        bitrate,
        ..AudioMetadata::default()
    };

    read_tags(&mut probed, &mut metadata);
    if metadata.duration_seconds.is_none() {
        warn!("'{}' does not record its duration", path.display());
    }

    Ok(metadata)
}

/// Fill the tag fields from whichever metadata revision the file carries.
/// Missing tags leave the fields untouched.
fn read_tags(probed: &mut ProbeResult, metadata: &mut AudioMetadata) {
    let mut apply = |revision: &MetadataRevision| {
        for tag in revision.tags() {
            let slot = match tag.std_key {
                Some(StandardTagKey::TrackTitle) => &mut metadata.title,
                Some(StandardTagKey::Artist) => &mut metadata.artist,
                Some(StandardTagKey::Album) => &mut metadata.album,
                _ => continue,
            };
            slot.get_or_insert_with(|| tag.value.to_string());
        }
    };

    if let Some(revision) = probed.metadata.get().as_ref().and_then(|m| m.current()) {
        apply(revision);
    }
    if let Some(revision) = probed.format.metadata().current() {
        apply(revision);
    }

    if metadata.title.is_none() && metadata.artist.is_none() && metadata.album.is_none() {
        debug!("no tags found in '{}'", metadata.path.display());
    }
}

/// Render a byte count with binary units, e.g. `1.50 KB`.
pub fn human_readable_size(size_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if size_bytes == 0 {
        return "0 B".to_owned();
    }

    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{size:.2} {}", UNITS[unit])
}
