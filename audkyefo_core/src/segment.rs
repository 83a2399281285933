//! Conversion of a timeline length and a [`SplitPolicy`] into time windows.
//!
//! Everything here is a pure function of its arguments: the same duration and
//! policy always produce the same segments.

use std::str::FromStr;

use log::{debug, warn};

use crate::error::SplitError;
use crate::time::{parse_time, seconds_to_ms};

/// Upper bound on the number of segments a single split may produce.
pub const MAX_SEGMENTS: usize = 50_000;

/// A half-open window `[start_ms, end_ms)` of the source timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    /// 1-based position of the segment within its policy.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Segment {
    pub const fn new(index: usize, start_ms: u64, end_ms: u64) -> Self {
        Self {
            index,
            start_ms,
            end_ms,
        }
    }

    pub const fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_ms as f64 / 1_000.0
    }

    pub fn end_seconds(&self) -> f64 {
        self.end_ms as f64 / 1_000.0
    }
}

/// A user supplied range in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeRange {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl TimeRange {
    pub const fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }
}

impl FromStr for TimeRange {
    type Err = SplitError;

    /// Parses `MM:SS-MM:SS`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| SplitError::InvalidFormat {
                input: value.to_owned(),
            })?;
        Ok(Self::new(parse_time(start.trim())?, parse_time(end.trim())?))
    }
}

/// The splitting strategy and the parameters it needs.
#[derive(Clone, Debug, PartialEq)]
pub enum SplitMethod {
    EqualParts { num_parts: usize },
    FixedDuration { duration_seconds: f64 },
    CustomRanges { ranges: Vec<TimeRange> },
}

impl SplitMethod {
    pub fn name(&self) -> &'static str {
        match self {
            SplitMethod::EqualParts { .. } => "equal_parts",
            SplitMethod::FixedDuration { .. } => "fixed_duration",
            SplitMethod::CustomRanges { .. } => "custom_ranges",
        }
    }
}

/// A [`SplitMethod`] together with the overlap shared by all methods.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitPolicy {
    pub method: SplitMethod,
    /// Extra audio added around window boundaries, in seconds. Ignored for
    /// custom ranges.
    pub overlap_seconds: f64,
}

impl SplitPolicy {
    pub fn new(method: SplitMethod) -> Self {
        Self {
            method,
            overlap_seconds: 0.0,
        }
    }

    pub fn equal_parts(num_parts: usize) -> Self {
        Self::new(SplitMethod::EqualParts { num_parts })
    }

    pub fn fixed_duration(duration_seconds: f64) -> Self {
        Self::new(SplitMethod::FixedDuration { duration_seconds })
    }

    pub fn custom_ranges<I: IntoIterator<Item = TimeRange>>(ranges: I) -> Self {
        Self::new(SplitMethod::CustomRanges {
            ranges: ranges.into_iter().collect(),
        })
    }

    pub fn with_overlap(mut self, overlap_seconds: f64) -> Self {
        self.overlap_seconds = overlap_seconds;
        self
    }
}

/// Compute the windows `policy` cuts out of a timeline of `total_duration_ms`.
///
/// Segments come back in increasing index order with their ends clamped to
/// the timeline. Windows that would be empty are left out.
pub fn compute_segments(
    total_duration_ms: u64,
    policy: &SplitPolicy,
) -> Result<Vec<Segment>, SplitError> {
    let overlap_ms = seconds_to_ms(policy.overlap_seconds).ok_or_else(|| {
        SplitError::InvalidParameter("overlap must be zero or a positive number of seconds".into())
    })?;

    let segments = match &policy.method {
        SplitMethod::EqualParts { num_parts } => {
            equal_parts(total_duration_ms, *num_parts, overlap_ms)?
        }
        SplitMethod::FixedDuration { duration_seconds } => {
            fixed_duration(total_duration_ms, *duration_seconds, overlap_ms)?
        }
        SplitMethod::CustomRanges { ranges } => custom_ranges(total_duration_ms, ranges)?,
    };

    debug!(
        "{} produced {} segment(s) for {} ms of audio",
        policy.method.name(),
        segments.len(),
        total_duration_ms
    );
    Ok(segments)
}

fn window(index: usize, start_ms: u64, end_ms: u64, total_ms: u64) -> Option<Segment> {
    let end_ms = end_ms.min(total_ms);
    if start_ms >= end_ms || start_ms >= total_ms {
        debug!("dropping empty window {index} [{start_ms}, {end_ms})");
        return None;
    }
    Some(Segment::new(index, start_ms, end_ms))
}

fn check_limit(count: u64) -> Result<(), SplitError> {
    if count > MAX_SEGMENTS as u64 {
        return Err(SplitError::SegmentLimitExceeded {
            limit: MAX_SEGMENTS,
        });
    }
    Ok(())
}

fn equal_parts(total_ms: u64, num_parts: usize, overlap_ms: u64) -> Result<Vec<Segment>, SplitError> {
    if num_parts < 2 {
        return Err(SplitError::InvalidParameter(
            "number of parts must be at least 2".into(),
        ));
    }
    check_limit(num_parts as u64)?;
    // Parts shorter than a millisecond cannot be addressed.
    if total_ms < num_parts as u64 {
        return Err(SplitError::InvalidParameter(format!(
            "audio is shorter than the number of parts ({total_ms} ms for {num_parts} parts)"
        )));
    }

    // Integer boundaries keep the parts contiguous and summing to the total.
    let boundary = |i: usize| (u128::from(total_ms) * i as u128 / num_parts as u128) as u64;

    Ok((0..num_parts)
        .filter_map(|i| {
            let start = boundary(i).saturating_sub(overlap_ms);
            let end = boundary(i + 1).saturating_add(overlap_ms);
            window(i + 1, start, end, total_ms)
        })
        .collect())
}

fn fixed_duration(
    total_ms: u64,
    duration_seconds: f64,
    overlap_ms: u64,
) -> Result<Vec<Segment>, SplitError> {
    let duration_ms = seconds_to_ms(duration_seconds)
        .filter(|ms| *ms > 0)
        .ok_or_else(|| SplitError::InvalidParameter("duration must be greater than 0".into()))?;
    let step_ms = duration_ms
        .checked_sub(overlap_ms)
        .filter(|step| *step > 0)
        .ok_or_else(|| {
            SplitError::InvalidParameter("overlap must be shorter than the segment duration".into())
        })?;

    let num_parts = total_ms.saturating_add(overlap_ms).div_ceil(step_ms).max(1);
    check_limit(num_parts)?;

    let mut segments = Vec::with_capacity(num_parts as usize);
    for i in 0..num_parts {
        let start = i.saturating_mul(step_ms);
        if start >= total_ms {
            break;
        }
        let end = start.saturating_add(duration_ms);
        segments.extend(window(i as usize + 1, start, end, total_ms));
    }

    Ok(segments)
}

fn clamped_ms(seconds: f64) -> Option<u64> {
    seconds
        .is_finite()
        .then(|| seconds_to_ms(seconds.max(0.0)))
        .flatten()
}

fn custom_ranges(total_ms: u64, ranges: &[TimeRange]) -> Result<Vec<Segment>, SplitError> {
    if ranges.is_empty() {
        return Err(SplitError::InvalidParameter("no time ranges specified".into()));
    }
    check_limit(ranges.len() as u64)?;

    Ok(ranges
        .iter()
        .enumerate()
        .filter_map(|(i, range)| {
            let bounds = clamped_ms(range.start_seconds).zip(clamped_ms(range.end_seconds));
            let segment = bounds.and_then(|(start, end)| window(i + 1, start, end, total_ms));
            if segment.is_none() {
                warn!(
                    "skipping invalid range {}: {}-{}",
                    i + 1,
                    range.start_seconds,
                    range.end_seconds
                );
            }
            segment
        })
        .collect())
}
