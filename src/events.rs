//! Event detection on the trigger channel.
//!
//! Follows `mne.find_events(consecutive='increasing', output='onset')`: an
//! event is emitted at every sample where the trigger value becomes non-zero
//! or steps up to a larger value. Falling edges and steps down are ignored.
use std::fmt;

/// Stimulus categories of the auditory/visual sample paradigm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StimulusKind {
    AuditoryLeft,
    AuditoryRight,
    VisualLeft,
    VisualRight,
}

impl StimulusKind {
    pub const ALL: [StimulusKind; 4] = [
        StimulusKind::AuditoryLeft,
        StimulusKind::AuditoryRight,
        StimulusKind::VisualLeft,
        StimulusKind::VisualRight,
    ];

    /// Trigger code written to `STI 014`.
    pub fn code(self) -> i32 {
        match self {
            StimulusKind::AuditoryLeft  => 1,
            StimulusKind::AuditoryRight => 2,
            StimulusKind::VisualLeft    => 3,
            StimulusKind::VisualRight   => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            StimulusKind::AuditoryLeft  => "auditory/left",
            StimulusKind::AuditoryRight => "auditory/right",
            StimulusKind::VisualLeft    => "visual/left",
            StimulusKind::VisualRight   => "visual/right",
        }
    }
}

impl fmt::Display for StimulusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A labelled stimulus onset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Sample index relative to the first sample of the recording.
    pub sample: usize,
    pub kind:   StimulusKind,
}

/// Trigger onsets in `stim` as `(sample, code)`, codes of any value.
///
/// The trigger trace is rounded to integers first; the first sample can never
/// be an onset.
pub fn find_onsets(stim: &[f64]) -> Vec<(usize, i32)> {
    let codes: Vec<i32> = stim.iter().map(|v| v.round() as i32).collect();
    codes
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[1] != 0 && w[1] > w[0])
        .map(|(i, w)| (i + 1, w[1]))
        .collect()
}

/// Onsets whose code belongs to one of `stimuli`, in temporal order.
///
/// ```
/// use eeg_entropy::events::{find_events, StimulusKind};
/// let stim = [0.0, 0.0, 1.0, 1.0, 0.0, 3.0, 0.0, 5.0, 0.0];
/// let ev = find_events(&stim, &StimulusKind::ALL);
/// assert_eq!(ev.len(), 2);
/// assert_eq!((ev[0].sample, ev[0].kind), (2, StimulusKind::AuditoryLeft));
/// assert_eq!((ev[1].sample, ev[1].kind), (5, StimulusKind::VisualLeft));
/// ```
pub fn find_events(stim: &[f64], stimuli: &[StimulusKind]) -> Vec<Event> {
    find_onsets(stim)
        .into_iter()
        .filter_map(|(sample, code)| {
            StimulusKind::from_code(code)
                .filter(|k| stimuli.contains(k))
                .map(|kind| Event { sample, kind })
        })
        .collect()
}
