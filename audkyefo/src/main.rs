mod cli;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use audkyefo_core::{
    format_time, plan, probe, split, AudioMetadata, DecodedAudio, Flow, OutputFormat, OutputSpec,
    ProgressEvent, Quality,
};
use clap::error::ErrorKind;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::cli::{build_cli, split_policy};

fn print_info(metadata: &AudioMetadata) {
    println!("File:        {}", metadata.file_name);
    println!("Format:      {}", metadata.format.to_uppercase());
    match metadata.duration_seconds {
        Some(seconds) => println!("Duration:    {} ({seconds:.2} s)", format_time(seconds)),
        None => println!("Duration:    unknown"),
    }
    println!("Channels:    {}", metadata.channels);
    println!("Sample rate: {} Hz", metadata.sample_rate);
    if let Some(bits) = metadata.bits_per_sample {
        println!("Bit depth:   {bits} bit");
    }
    if let Some(bitrate) = metadata.bitrate {
        println!("Bitrate:     {} kbps", bitrate / 1_000);
    }
    println!(
        "Size:        {} ({} bytes)",
        metadata.size_human, metadata.size_bytes
    );
    for (label, value) in [
        ("Title:      ", &metadata.title),
        ("Artist:     ", &metadata.artist),
        ("Album:      ", &metadata.album),
    ] {
        if let Some(value) = value {
            println!("{label} {value}");
        }
    }
}

fn progress_bar() -> ProgressBar {
    let progress = ProgressBar::new(100);
    progress.set_draw_target(ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

fn output_spec(matches: &clap::ArgMatches, output_dir: &Path) -> anyhow::Result<OutputSpec> {
    let format = *matches
        .get_one::<OutputFormat>("format")
        .expect("defaulted argument");
    let quality = *matches
        .get_one::<Quality>("quality")
        .expect("defaulted argument");
    let pattern = matches
        .get_one::<String>("pattern")
        .expect("defaulted argument");

    OutputSpec::builder(output_dir)
        .format(format)
        .quality(quality)
        .naming_pattern(pattern.as_str())
        .overwrite(matches.get_flag("overwrite"))
        .build()
        .with_context(|| format!("invalid output settings for '{}'", output_dir.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let input_path = matches
        .get_one::<PathBuf>("file_path")
        .expect("required argument");
    if !input_path.is_file() {
        return Err(anyhow!(
            "input file does not exist: {}",
            input_path.display()
        ));
    }

    if matches.get_flag("info") {
        let metadata = probe(input_path)
            .with_context(|| format!("failed to read '{}'", input_path.display()))?;
        print_info(&metadata);
        return Ok(());
    }

    let Some(policy) = split_policy(&matches) else {
        build_cli()
            .error(
                ErrorKind::MissingRequiredArgument,
                "one of --parts, --length or --range is required",
            )
            .exit();
    };
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .expect("defaulted argument");
    let output = output_spec(&matches, output_dir)?;

    let audio = DecodedAudio::open(input_path)
        .with_context(|| format!("failed to load '{}'", input_path.display()))?;

    if matches.get_flag("dry-run") {
        let planned = plan(Some(&audio), &policy, &output)
            .with_context(|| format!("failed to plan segments for '{}'", input_path.display()))?;

        if planned.is_empty() {
            println!("Dry run: no segments would be generated.");
        } else {
            println!("Dry run: would generate {} segment(s):", planned.len());
            for entry in planned {
                println!("  {}", entry.path.display());
            }
        }

        return Ok(());
    }

    let progress = progress_bar();
    let progress_handle = progress.clone();
    let mut reporter = move |event: &ProgressEvent| {
        progress_handle.set_position(u64::from(event.percent));
        progress_handle.set_message(event.message.clone());
        Flow::Continue
    };

    let result = split(Some(&audio), &policy, &output, &mut reporter)
        .with_context(|| format!("failed to split '{}'", input_path.display()));

    progress.finish_and_clear();

    let written = result?;
    println!("Created {} file(s):", written.len());
    for path in written {
        println!("  {}", path.display());
    }

    Ok(())
}
