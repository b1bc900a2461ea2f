//! Event-locked epoching.
//!
//! Cuts a window `[tmin, tmax]` (both ends inclusive) around every event of a
//! preprocessed [`Recording`] and subtracts the per-channel mean of the
//! baseline window from each epoch. Events whose window does not fit inside
//! the recording are dropped.
use anyhow::{bail, Result};
use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, Axis};
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::events::Event;
use crate::recording::Recording;

#[derive(Debug, Clone)]
pub struct Epochs {
    /// `[E, C, T]`.
    pub data:     Array3<f64>,
    /// The event each epoch is anchored on, in epoch order.
    pub events:   Vec<Event>,
    pub ch_names: Vec<String>,
    pub sfreq:    f64,
    /// Offset of the first epoch sample relative to the event, in samples.
    pub start:    i64,
}

impl Epochs {
    pub fn n_epochs(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn n_channels(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn n_times(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Time of every epoch sample relative to the event, in seconds.
    pub fn times(&self) -> Vec<f64> {
        (0..self.n_times())
            .map(|i| (self.start + i as i64) as f64 / self.sfreq)
            .collect()
    }

    /// `[C, T]` view of epoch `e`.
    pub fn epoch(&self, e: usize) -> ArrayView2<'_, f64> {
        self.data.slice(s![e, .., ..])
    }

    pub fn signal(&self, e: usize, ch: usize) -> ArrayView1<'_, f64> {
        self.data.slice(s![e, ch, ..])
    }
}

/// Cut baseline-corrected epochs around `events`.
pub fn epoch_events(rec: &Recording, events: &[Event], cfg: &AnalysisConfig) -> Result<Epochs> {
    if cfg.tmax < cfg.tmin {
        bail!("epoch window is empty: tmin {} > tmax {}", cfg.tmin, cfg.tmax);
    }
    let (start, stop) = cfg.epoch_offsets(rec.sfreq);
    let (b_start, b_stop) = cfg.baseline_offsets(rec.sfreq);
    if b_start < start || b_stop > stop || b_stop < b_start {
        bail!(
            "baseline {:?} s must lie inside the epoch window [{}, {}] s",
            cfg.baseline, cfg.tmin, cfg.tmax
        );
    }
    let n_t = (stop - start + 1) as usize;
    let n_times = rec.n_times() as i64;

    let kept: Vec<Event> = events
        .iter()
        .copied()
        .filter(|ev| {
            let s = ev.sample as i64;
            s + start >= 0 && s + stop < n_times
        })
        .collect();
    if kept.len() < events.len() {
        warn!(dropped = events.len() - kept.len(), "events too close to the recording edges");
    }

    let mut data = Array3::<f64>::zeros((kept.len(), rec.n_channels(), n_t));
    for (e, ev) in kept.iter().enumerate() {
        let first = (ev.sample as i64 + start) as usize;
        data.slice_mut(s![e, .., ..])
            .assign(&rec.data.slice(s![.., first..first + n_t]));
    }

    let b0 = (b_start - start) as usize;
    let b1 = (b_stop - start) as usize;
    for mut ep in data.outer_iter_mut() {
        baseline_correct(&mut ep, b0..=b1);
    }

    info!(n_epochs = kept.len(), n_times = n_t, tmin = cfg.tmin, tmax = cfg.tmax, "epoched");
    Ok(Epochs { data, events: kept, ch_names: rec.ch_names.clone(), sfreq: rec.sfreq, start })
}

/// Subtract the mean over `window` (sample indices) from every channel row.
fn baseline_correct(ep: &mut ndarray::ArrayViewMut2<'_, f64>, window: std::ops::RangeInclusive<usize>) {
    for mut row in ep.rows_mut() {
        let mean = row.slice(s![window.clone()]).mean().unwrap_or(0.0);
        row -= mean;
    }
}

/// Stack per-channel `[C, T]` epochs built elsewhere (e.g. synthetic data).
pub fn from_arrays(
    epochs: Vec<Array2<f64>>,
    events: Vec<Event>,
    ch_names: Vec<String>,
    sfreq: f64,
    start: i64,
) -> Result<Epochs> {
    if epochs.len() != events.len() {
        bail!("{} epochs for {} events", epochs.len(), events.len());
    }
    let (n_ch, n_t) = match epochs.first() {
        Some(e) => e.dim(),
        None => (ch_names.len(), 0),
    };
    if n_ch != ch_names.len() {
        bail!("{} channel names for {n_ch} channels", ch_names.len());
    }
    let mut data = Array3::<f64>::zeros((epochs.len(), n_ch, n_t));
    for (e, ep) in epochs.iter().enumerate() {
        if ep.dim() != (n_ch, n_t) {
            bail!("epoch {e} has shape {:?}, expected {:?}", ep.dim(), (n_ch, n_t));
        }
        data.slice_mut(s![e, .., ..]).assign(ep);
    }
    Ok(Epochs { data, events, ch_names, sfreq, start })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StimulusKind;
    use ndarray::{Array1, Array2};

    fn ramp_recording(n_ch: usize, n_t: usize, sfreq: f64) -> Recording {
        let data = Array2::from_shape_fn((n_ch, n_t), |(c, t)| (c * 1000 + t) as f64);
        let names = (0..n_ch).map(|c| format!("EEG {c:03}")).collect();
        Recording::new(names, sfreq, data, Array1::zeros(n_t)).unwrap()
    }

    fn ev(sample: usize) -> Event {
        Event { sample, kind: StimulusKind::AuditoryLeft }
    }

    #[test]
    fn shape_and_times() {
        let rec = ramp_recording(3, 1000, 100.0);
        let epochs = epoch_events(&rec, &[ev(100), ev(500)], &AnalysisConfig::default()).unwrap();
        assert_eq!(epochs.data.dim(), (2, 3, 71));
        let times = epochs.times();
        approx::assert_abs_diff_eq!(times[0], -0.2, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(times[20], 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(times[70], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn baseline_mean_is_zero() {
        let rec = ramp_recording(2, 1000, 100.0);
        let epochs = epoch_events(&rec, &[ev(300)], &AnalysisConfig::default()).unwrap();
        for ch in 0..2 {
            let baseline = epochs.signal(0, ch).slice(s![0..=20]).mean().unwrap();
            approx::assert_abs_diff_eq!(baseline, 0.0, epsilon = 1e-9);
        }
        // ramp of slope 1: the sample at t = 0 sits 10 above the baseline mean
        approx::assert_abs_diff_eq!(epochs.signal(0, 1)[20], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn out_of_range_events_are_dropped() {
        let rec = ramp_recording(1, 200, 100.0);
        // needs 20 samples before and 50 after
        let events = [ev(19), ev(20), ev(149), ev(150)];
        let epochs = epoch_events(&rec, &events, &AnalysisConfig::default()).unwrap();
        let kept: Vec<usize> = epochs.events.iter().map(|e| e.sample).collect();
        assert_eq!(kept, vec![20, 149]);
    }

    #[test]
    fn baseline_outside_window_is_rejected() {
        let rec = ramp_recording(1, 200, 100.0);
        let cfg = AnalysisConfig { baseline: (-0.5, 0.0), ..AnalysisConfig::default() };
        assert!(epoch_events(&rec, &[ev(100)], &cfg).is_err());
    }

    #[test]
    fn from_arrays_checks_shapes() {
        let names = vec!["A".to_string()];
        let ok = from_arrays(vec![Array2::zeros((1, 5))], vec![ev(0)], names.clone(), 10.0, -2);
        assert_eq!(ok.unwrap().n_times(), 5);
        let bad = from_arrays(vec![Array2::zeros((1, 5)), Array2::zeros((1, 4))], vec![ev(0), ev(1)], names, 10.0, 0);
        assert!(bad.is_err());
    }
}
