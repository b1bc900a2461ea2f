//! Entropy table: one record per (condition, channel, epoch, kind).
//!
//! Every epoch is split at the stimulus onset into a rest window (`t < 0`)
//! and a task window (`t > 0`); the onset sample itself belongs to neither.
//! Windows whose population standard deviation is below the configured
//! threshold are counted and skipped before any estimator runs.
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::entropy::{compute, population_std, EntropyKind};
use crate::epoch::Epochs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Condition {
    Rest,
    Task,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::Rest, Condition::Task];

    pub fn name(self) -> &'static str {
        match self {
            Condition::Rest => "rest",
            Condition::Task => "task",
        }
    }

    /// Whether a sample at time `t` (seconds from onset) falls in this window.
    pub fn contains(self, t: f64) -> bool {
        match self {
            Condition::Rest => t < 0.0,
            Condition::Task => t > 0.0,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Condition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Condition::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| anyhow!("unknown condition {s:?}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyRecord {
    pub condition: Condition,
    pub channel:   usize,
    pub epoch:     usize,
    pub kind:      EntropyKind,
    pub value:     f64,
}

impl EntropyRecord {
    /// Identity of the segment the value was computed from.
    pub fn key(&self) -> (usize, usize) {
        (self.epoch, self.channel)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntropyTable {
    pub records:          Vec<EntropyRecord>,
    /// Windows skipped as near-constant.
    pub skipped_segments: usize,
}

impl EntropyTable {
    /// Records of one kind and condition, in table order.
    pub fn select(&self, kind: EntropyKind, condition: Condition) -> impl Iterator<Item = &EntropyRecord> {
        self.records
            .iter()
            .filter(move |r| r.kind == kind && r.condition == condition)
    }

    pub fn values(&self, kind: EntropyKind, condition: Condition) -> Vec<f64> {
        self.select(kind, condition).map(|r| r.value).collect()
    }

    /// Kinds present in the table, in [`EntropyKind::ALL`] order.
    pub fn kinds(&self) -> Vec<EntropyKind> {
        EntropyKind::ALL
            .into_iter()
            .filter(|&k| self.records.iter().any(|r| r.kind == k))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sample index ranges of the rest and task windows of an epoch.
pub fn condition_ranges(times: &[f64]) -> [(Condition, std::ops::Range<usize>); 2] {
    let rest_end = times.iter().take_while(|&&t| Condition::Rest.contains(t)).count();
    let task_start = times
        .iter()
        .position(|&t| Condition::Task.contains(t))
        .unwrap_or(times.len());
    [(Condition::Rest, 0..rest_end), (Condition::Task, task_start..times.len())]
}

/// Compute every configured entropy kind for every window of `epochs`.
///
/// Records are ordered by epoch, then channel, then condition, then kind.
pub fn build_table(epochs: &Epochs, cfg: &AnalysisConfig) -> Result<EntropyTable> {
    let ranges = condition_ranges(&epochs.times());
    let mut table = EntropyTable::default();

    for e in 0..epochs.n_epochs() {
        for ch in 0..epochs.n_channels() {
            let signal = epochs.signal(e, ch);
            for (condition, range) in &ranges {
                let segment: Vec<f64> = signal.slice(ndarray::s![range.clone()]).to_vec();
                if segment.is_empty() || population_std(&segment) < cfg.std_threshold {
                    table.skipped_segments += 1;
                    continue;
                }
                let set = compute(&segment, &cfg.kinds, &cfg.entropy).with_context(|| {
                    format!("{condition} window of epoch {e}, channel {}", epochs.ch_names[ch])
                })?;
                table.records.extend(set.iter().map(|(kind, value)| EntropyRecord {
                    condition: *condition,
                    channel: ch,
                    epoch: e,
                    kind,
                    value,
                }));
            }
        }
        debug!(epoch = e, records = table.records.len(), "entropy computed");
    }

    info!(
        records = table.records.len(),
        skipped_segments = table.skipped_segments,
        "entropy table built"
    );
    Ok(table)
}
