//! In-memory multichannel recording.
//!
//! A [`Recording`] holds the EEG channels picked from a raw FIF file together
//! with the trigger trace events are read from. It is never mutated once
//! built; preprocessing returns a new value.
use std::path::Path;
use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array1, Array2, ArrayView1};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::fiff::{open_raw, ChannelKind, RawFif};

#[derive(Debug, Clone)]
pub struct Recording {
    /// Names of the rows of `data`, in order.
    pub ch_names:   Vec<String>,
    pub ch_kinds:   Vec<ChannelKind>,
    pub sfreq:      f64,
    /// `[C, T]` in volts.
    pub data:       Array2<f64>,
    /// Trigger trace, `T` samples.
    pub stim:       Array1<f64>,
    /// First sample of `data` in acquisition time.
    pub first_samp: u64,
    /// Bad channels named by the measurement info, whether picked or not.
    pub bads:       Vec<String>,
}

impl Recording {
    /// Build a recording from arrays; `data` rows must match `ch_names`.
    pub fn new(ch_names: Vec<String>, sfreq: f64, data: Array2<f64>, stim: Array1<f64>) -> Result<Self> {
        if !(sfreq > 0.0 && sfreq.is_finite()) {
            bail!("sampling rate must be positive, got {sfreq}");
        }
        if data.nrows() != ch_names.len() {
            bail!("{} channel names for {} data rows", ch_names.len(), data.nrows());
        }
        if stim.len() != data.ncols() {
            bail!("trigger trace has {} samples, data has {}", stim.len(), data.ncols());
        }
        let ch_kinds = vec![ChannelKind::Eeg; ch_names.len()];
        Ok(Self { ch_names, ch_kinds, sfreq, data, stim, first_samp: 0, bads: Vec::new() })
    }

    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.sfreq
    }

    pub fn channel(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.data.row(idx)
    }

    /// Same metadata, new samples.
    pub fn with_data(&self, data: Array2<f64>) -> Result<Self> {
        if data.dim() != self.data.dim() {
            bail!("replacement data {:?} does not match recording {:?}", data.dim(), self.data.dim());
        }
        Ok(Self { data, ..self.clone_meta() })
    }

    fn clone_meta(&self) -> Self {
        Self {
            ch_names:   self.ch_names.clone(),
            ch_kinds:   self.ch_kinds.clone(),
            sfreq:      self.sfreq,
            data:       Array2::zeros((0, 0)),
            stim:       self.stim.clone(),
            first_samp: self.first_samp,
            bads:       self.bads.clone(),
        }
    }
}

/// Indices of the EEG channels of `raw`, optionally without bad channels.
pub fn pick_eeg(raw: &RawFif, exclude_bads: bool) -> Vec<usize> {
    raw.info
        .chs
        .iter()
        .enumerate()
        .filter(|(_, ch)| ch.kind == ChannelKind::Eeg)
        .filter(|(_, ch)| !(exclude_bads && raw.info.is_bad(&ch.name)))
        .map(|(i, _)| i)
        .collect()
}

/// Index of the channel called `name`.
pub fn find_channel(raw: &RawFif, name: &str) -> Option<usize> {
    raw.info.chs.iter().position(|ch| ch.name == name)
}

/// Load the EEG channels and trigger trace of a raw FIF file.
pub fn load_recording<P: AsRef<Path>>(path: P, cfg: &AnalysisConfig) -> Result<Recording> {
    let path = path.as_ref();
    let raw = open_raw(path).with_context(|| format!("read FIF header of {}", path.display()))?;

    let picks = pick_eeg(&raw, cfg.exclude_bads);
    if picks.is_empty() {
        bail!("{} has no usable EEG channels", path.display());
    }
    let stim_idx = find_channel(&raw, &cfg.stim_channel)
        .ok_or_else(|| anyhow!("trigger channel {:?} not found in {}", cfg.stim_channel, path.display()))?;

    let mut rows = picks.clone();
    rows.push(stim_idx);
    let all = raw.read_channels(&rows)?;
    let data = all.slice(ndarray::s![..picks.len(), ..]).to_owned();
    let stim = all.row(picks.len()).to_owned();

    info!(
        n_eeg = picks.len(),
        n_bads = raw.info.bads.len(),
        sfreq = raw.info.sfreq,
        duration_s = raw.duration_secs(),
        "loaded recording"
    );

    Ok(Recording {
        ch_names:   picks.iter().map(|&i| raw.info.chs[i].name.clone()).collect(),
        ch_kinds:   picks.iter().map(|&i| raw.info.chs[i].kind).collect(),
        sfreq:      raw.info.sfreq,
        data,
        stim,
        first_samp: raw.first_samp,
        bads:       raw.info.bads.clone(),
    })
}
