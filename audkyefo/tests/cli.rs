use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Generate a small single-channel WAV file for testing.
///
/// The fixtures are produced on the fly by emitting a PCM RIFF header followed by
/// procedurally generated sine-wave samples, so no binary assets are committed.
fn write_test_tone<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    duration_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let total_samples = ((sample_rate as u64 * duration_ms).max(1_000) + 999) / 1_000;
    let mut samples = Vec::with_capacity(total_samples as usize * 2);

    for n in 0..total_samples {
        let theta = (n as f32 / sample_rate as f32) * 2.0 * std::f32::consts::PI * 440.0;
        let sample = (theta.sin() * i16::MAX as f32) as i16;
        samples.extend_from_slice(&sample.to_le_bytes());
    }

    let mut file = File::create(path)?;
    let data_len = samples.len() as u32;
    file.write_all(b"RIFF")?;
    file.write_all(&(36u32 + data_len).to_le_bytes())?;
    file.write_all(b"WAVE")?;
    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?; // PCM header size
    file.write_all(&1u16.to_le_bytes())?; // audio format = PCM
    file.write_all(&1u16.to_le_bytes())?; // channels
    file.write_all(&sample_rate.to_le_bytes())?;
    file.write_all(&(sample_rate * 2).to_le_bytes())?;
    file.write_all(&2u16.to_le_bytes())?; // block align
    file.write_all(&16u16.to_le_bytes())?; // bits per sample
    file.write_all(b"data")?;
    file.write_all(&data_len.to_le_bytes())?;
    file.write_all(&samples)?;
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();
    Ok(entries)
}

fn audkyefo() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("audkyefo")?)
}

#[test]
fn cli_splits_audio_into_segments_with_remainder() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 1_100)?;
    let output_dir = tempdir()?;

    audkyefo()?
        .args(["--length", "400ms", "--quality", "low", "--output"])
        .arg(output_dir.path())
        .arg(&input_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 3 file(s):"));

    let segments = sorted_entries(output_dir.path())?;
    let names: Vec<_> = segments
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        ["input_part_001.wav", "input_part_002.wav", "input_part_003.wav"]
    );

    let frames = segments
        .iter()
        .map(|path| hound::WavReader::open(path).map(|reader| reader.duration()))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(frames, vec![3_200, 3_200, 2_400]);

    output_dir.close()?;
    input_dir.close()?;
    Ok(())
}

#[test]
fn cli_splits_custom_ranges_with_pattern() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("take.wav");
    write_test_tone(&input_path, 8_000, 3_000)?;
    let output_dir = tempdir()?;

    audkyefo()?
        .args(["--range", "00:00-00:01", "--range", "00:02-00:09"])
        .args(["--pattern", "{original_name}-{number:02d}", "--output"])
        .arg(output_dir.path())
        .arg(&input_path)
        .assert()
        .success();

    let segments = sorted_entries(output_dir.path())?;
    assert_eq!(
        segments,
        vec![
            output_dir.path().join("take-01.wav"),
            output_dir.path().join("take-02.wav")
        ]
    );
    assert_eq!(hound::WavReader::open(&segments[1])?.duration(), 8_000);
    Ok(())
}

#[test]
fn cli_reports_missing_input_file() -> Result<(), Box<dyn Error>> {
    let output_dir = tempdir()?;

    audkyefo()?
        .args(["--parts", "2", "--output"])
        .arg(output_dir.path())
        .arg("missing.wav")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input file does not exist"));

    output_dir.close()?;
    Ok(())
}

#[test]
fn cli_requires_a_split_method() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 500)?;

    audkyefo()?
        .arg(&input_path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("one of --parts, --length or --range"));
    Ok(())
}

#[test]
fn cli_rejects_conflicting_methods() -> Result<(), Box<dyn Error>> {
    audkyefo()?
        .args(["--parts", "2", "--length", "1s", "input.wav"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
    Ok(())
}

#[test]
fn cli_dry_run_prints_plan_without_creating_files() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 1_100)?;
    let output_dir = tempdir()?;

    let assert = audkyefo()?
        .args(["--parts", "3", "--dry-run", "--output"])
        .arg(output_dir.path())
        .arg(&input_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run: would generate 3 segment(s):"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    for index in 1..=3 {
        let path = output_dir.path().join(format!("input_part_{index:03}.wav"));
        let needle = format!("  {}", path.display());
        assert!(stdout.contains(&needle), "missing dry-run entry for {needle}");
    }

    assert!(sorted_entries(output_dir.path())?.is_empty());
    Ok(())
}

#[test]
fn cli_refuses_to_overwrite_without_flag() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 1_000)?;
    let output_dir = tempdir()?;
    let existing = output_dir.path().join("input_part_001.wav");
    fs::write(&existing, b"original")?;

    audkyefo()?
        .args(["--parts", "2", "--output"])
        .arg(output_dir.path())
        .arg(&input_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("output file already exists"));
    assert_eq!(fs::read(&existing)?, b"original");

    audkyefo()?
        .args(["--parts", "2", "--overwrite", "--output"])
        .arg(output_dir.path())
        .arg(&input_path)
        .assert()
        .success();
    assert_eq!(hound::WavReader::open(&existing)?.duration(), 4_000);
    Ok(())
}

#[test]
fn cli_reports_unsupported_output_format() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 1_000)?;
    let output_dir = tempdir()?;

    audkyefo()?
        .args(["--parts", "2", "--format", "mp3", "--output"])
        .arg(output_dir.path())
        .arg(&input_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported output format 'mp3'"));
    assert!(sorted_entries(output_dir.path())?.is_empty());
    Ok(())
}

#[test]
fn cli_info_prints_metadata() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let input_path = input_dir.path().join("input.wav");
    write_test_tone(&input_path, 8_000, 2_000)?;

    audkyefo()?
        .arg("--info")
        .arg(&input_path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("File:        input.wav")
                .and(predicate::str::contains("Duration:    00:02 (2.00 s)"))
                .and(predicate::str::contains("Sample rate: 8000 Hz"))
                .and(predicate::str::contains("Channels:    1")),
        );
    Ok(())
}
