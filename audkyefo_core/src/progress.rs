/// Percent reported once the segments are about to be computed.
pub const PROGRESS_ANALYSIS: u8 = 20;
/// Percent reported right before the first segment is exported.
pub const PROGRESS_SPLITTING_START: u8 = 30;
/// Upper end of the range covered by per-segment events.
pub const PROGRESS_SPLITTING_END: u8 = 90;
pub const PROGRESS_COMPLETE: u8 = 100;

/// A progress notification emitted while a split runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Completion in percent, `0..=100`.
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new<S: Into<String>>(percent: u8, message: S) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

/// Whether the split should go on after a progress event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    #[default]
    Continue,
    Cancel,
}

/// Receives progress events during a split.
///
/// Returning [`Flow::Cancel`] from the event announcing a segment stops the
/// split before that segment is written. Closures taking a `&ProgressEvent`
/// and returning a [`Flow`] implement this trait.
pub trait ProgressReporter {
    fn report(&mut self, event: &ProgressEvent) -> Flow {
        let _ = event;
        Flow::Continue
    }
}

impl<F> ProgressReporter for F
where
    F: FnMut(&ProgressEvent) -> Flow,
{
    fn report(&mut self, event: &ProgressEvent) -> Flow {
        self(event)
    }
}

/// Reporter that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}

/// Percent for the segment at `position` (0-based) out of `total`, spread
/// linearly over the splitting range.
pub fn splitting_percent(position: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_SPLITTING_START;
    }
    let span = usize::from(PROGRESS_SPLITTING_END - PROGRESS_SPLITTING_START);
    let offset = span * position.min(total) / total;
    PROGRESS_SPLITTING_START + offset as u8
}
