//! Decoded audio timelines and slice export.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{debug, info, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, ProbeResult};
use symphonia::default::{get_codecs, get_probe};

use crate::error::{ExportFailure, SplitError};
use crate::output::{OutputFormat, Quality};

/// A loaded audio timeline that segments can be cut from.
///
/// Splitting only reads from the source, so one source may back several
/// consecutive splits.
pub trait AudioSource {
    /// Name of the file the audio was loaded from, extension included.
    fn file_name(&self) -> &str;

    fn duration_ms(&self) -> u64;

    fn channels(&self) -> u16;

    fn sample_rate(&self) -> u32;

    /// Formats [`AudioSource::export_slice`] is able to write.
    fn supported_formats(&self) -> &[OutputFormat] {
        &OutputFormat::ALL
    }

    /// Write the audio in `[start_ms, end_ms)` to `output_path`.
    fn export_slice(
        &self,
        start_ms: u64,
        end_ms: u64,
        output_path: &Path,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<(), ExportFailure>;
}

/// Open `path` and detect its container format.
pub(crate) fn open_reader(path: &Path) -> Result<ProbeResult, SplitError> {
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| match err {
            SymphoniaError::Unsupported(_) => SplitError::UnsupportedInput(path.to_path_buf()),
            other => SplitError::from(other),
        })
}

/// An audio file fully decoded into interleaved `f32` samples.
///
/// Slices are exported as WAV through `hound`; other formats are reported
/// as unsupported.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    path: PathBuf,
    file_name: String,
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl DecodedAudio {
    /// Decode the default track of the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SplitError> {
        let path = path.as_ref();
        let probed = open_reader(path)?;
        let mut reader = probed.format;

        let track = reader
            .default_track()
            .ok_or(SplitError::MissingDefaultTrack)?;
        if track.codec_params.codec == CODEC_TYPE_NULL {
            return Err(SplitError::UnsupportedCodec);
        }

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or(SplitError::MissingSampleRate)?;
        let mut channels = track.codec_params.channels.map(|c| c.count());
        let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();
        loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(err) => return Err(SplitError::from(err)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    channels.get_or_insert(spec.channels.count());
                    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    warn!("skipping undecodable packet in '{}': {err}", path.display());
                }
                Err(err) => return Err(SplitError::from(err)),
            }
        }

        let channels = channels.filter(|count| *count > 0).unwrap_or(1) as u16;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let audio = Self {
            path: path.to_path_buf(),
            file_name,
            sample_rate,
            channels,
            samples,
        };
        info!(
            "loaded '{}': {} ms, {} channel(s) at {} Hz",
            audio.path.display(),
            audio.duration_ms(),
            audio.channels,
            audio.sample_rate
        );
        Ok(audio)
    }

    /// Wrap samples that are already decoded.
    ///
    /// `samples` is interleaved by channel; a trailing partial frame is ignored.
    pub fn from_samples<S: Into<String>>(
        file_name: S,
        sample_rate: u32,
        channels: u16,
        samples: Vec<f32>,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            path: PathBuf::from(&file_name),
            file_name,
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
            samples,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    fn frame_at(&self, ms: u64) -> usize {
        let frame = u128::from(ms) * u128::from(self.sample_rate) / 1_000;
        usize::try_from(frame).map_or(self.frames(), |frame| frame.min(self.frames()))
    }
}

impl AudioSource for DecodedAudio {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn duration_ms(&self) -> u64 {
        self.frames() as u64 * 1_000 / u64::from(self.sample_rate)
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn supported_formats(&self) -> &[OutputFormat] {
        &[OutputFormat::Wav]
    }

    fn export_slice(
        &self,
        start_ms: u64,
        end_ms: u64,
        output_path: &Path,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<(), ExportFailure> {
        if format != OutputFormat::Wav {
            return Err(ExportFailure::UnsupportedFormat(format));
        }

        let channels = usize::from(self.channels);
        let first = self.frame_at(start_ms) * channels;
        let last = self.frame_at(end_ms).max(self.frame_at(start_ms)) * channels;
        debug!(
            "writing frames {}..{} to '{}'",
            first / channels,
            last / channels,
            output_path.display()
        );

        write_wav(
            output_path,
            self.sample_rate,
            self.channels,
            &self.samples[first..last],
            quality,
        )
    }
}

/// Bit depth and sample format a quality level maps to for WAV output.
fn wav_encoding(quality: Quality) -> (u16, SampleFormat) {
    match quality {
        Quality::Low => (16, SampleFormat::Int),
        Quality::Medium => (24, SampleFormat::Int),
        Quality::High => (32, SampleFormat::Float),
    }
}

fn write_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    samples: &[f32],
    quality: Quality,
) -> Result<(), ExportFailure> {
    let (bits_per_sample, sample_format) = wav_encoding(quality);
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format,
    };

    let mut writer = WavWriter::create(path, spec)?;
    match sample_format {
        SampleFormat::Float => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        }
        SampleFormat::Int => {
            let scale = ((1i64 << (bits_per_sample - 1)) - 1) as f32;
            for &sample in samples {
                writer.write_sample((sample.clamp(-1.0, 1.0) * scale).round() as i32)?;
            }
        }
    }
    writer.finalize()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, channels: u16) -> Vec<f32> {
        (0..frames * usize::from(channels))
            .map(|n| (n % 100) as f32 / 100.0)
            .collect()
    }

    #[test]
    fn reports_duration_from_frames() {
        let audio = DecodedAudio::from_samples("tone.wav", 8_000, 2, ramp(8_800, 2));
        assert_eq!(audio.frames(), 8_800);
        assert_eq!(audio.duration_ms(), 1_100);
        assert_eq!(audio.file_name(), "tone.wav");
    }

    #[test]
    fn exports_requested_frames() {
        let dir = tempfile::tempdir().unwrap();
        let audio = DecodedAudio::from_samples("tone.wav", 8_000, 2, ramp(8_000, 2));
        let path = dir.path().join("slice.wav");

        audio
            .export_slice(250, 500, &path, OutputFormat::Wav, Quality::Low)
            .unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.duration(), 2_000);
    }

    #[test]
    fn quality_selects_bit_depth() {
        assert_eq!(wav_encoding(Quality::Medium), (24, SampleFormat::Int));
        assert_eq!(wav_encoding(Quality::High), (32, SampleFormat::Float));
    }

    #[test]
    fn refuses_formats_without_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let audio = DecodedAudio::from_samples("tone.wav", 8_000, 1, ramp(800, 1));
        let err = audio
            .export_slice(0, 50, &dir.path().join("x.mp3"), OutputFormat::Mp3, Quality::High)
            .unwrap_err();
        assert!(matches!(err, ExportFailure::UnsupportedFormat(OutputFormat::Mp3)));
    }

    #[test]
    fn clamps_slices_past_the_end() {
        let dir = tempfile::tempdir().unwrap();
        let audio = DecodedAudio::from_samples("tone.wav", 1_000, 1, ramp(100, 1));
        let path = dir.path().join("tail.wav");
        audio
            .export_slice(50, 10_000, &path, OutputFormat::Wav, Quality::High)
            .unwrap();
        assert_eq!(hound::WavReader::open(&path).unwrap().duration(), 50);
    }
}
