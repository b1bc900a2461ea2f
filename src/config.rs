//! Analysis configuration.
//!
//! [`AnalysisConfig`] holds every tunable parameter of the rest-vs-task entropy
//! analysis. The defaults reproduce the reference analysis of the MNE sample
//! dataset (auditory/visual stimuli, EEG channels, 1–40 Hz).

use std::path::PathBuf;

use crate::entropy::{EntropyKind, EntropyParams};
use crate::events::StimulusKind;
use crate::stats::{PairingPolicy, UnpairedTest};

/// Configuration for the full analysis.
///
/// All fields are `pub`, so overrides use struct-update syntax:
///
/// ```
/// use eeg_entropy::AnalysisConfig;
///
/// let cfg = AnalysisConfig {
///     h_freq: 30.0,
///     notch_freqs: vec![50.0],
///     ..AnalysisConfig::default()
/// };
/// assert_eq!(cfg.l_freq, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Lower edge of the FIR band-pass in Hz.
    ///
    /// Default: `1.0` Hz.
    pub l_freq: f64,

    /// Upper edge of the FIR band-pass in Hz.
    ///
    /// Default: `40.0` Hz.
    pub h_freq: f64,

    /// Line-noise frequencies removed with a band-stop FIR. Frequencies at or
    /// above Nyquist are ignored.
    ///
    /// Default: `[60.0]` (the sample dataset was recorded in the US).
    pub notch_freqs: Vec<f64>,

    /// Transition bandwidth of each notch in Hz.
    ///
    /// Default: `1.0` Hz.
    pub notch_trans_bandwidth: f64,

    /// Re-reference EEG channels to their average after filtering.
    ///
    /// Default: `true`.
    pub average_reference: bool,

    /// Name of the trigger channel events are read from.
    ///
    /// Default: `"STI 014"`.
    pub stim_channel: String,

    /// Drop channels listed as bad in the measurement info.
    ///
    /// Default: `true`.
    pub exclude_bads: bool,

    /// Stimulus types kept for epoching; other trigger codes are ignored.
    ///
    /// Default: all four auditory/visual left/right stimuli.
    pub stimuli: Vec<StimulusKind>,

    /// Epoch start relative to stimulus onset, in seconds.
    ///
    /// Default: `-0.2` s.
    pub tmin: f64,

    /// Epoch end relative to stimulus onset, in seconds (inclusive).
    ///
    /// Default: `0.5` s.
    pub tmax: f64,

    /// Baseline window `(start, end)` in seconds, both inclusive. The
    /// per-channel mean over this window is subtracted from every epoch.
    ///
    /// Default: `(-0.2, 0.0)`.
    pub baseline: (f64, f64),

    /// Estimator parameters (histogram bins, embedding orders, tolerance).
    pub entropy: EntropyParams,

    /// Entropy measures computed for every segment.
    ///
    /// Default: all four kinds.
    pub kinds: Vec<EntropyKind>,

    /// Segments whose population standard deviation is below this value are
    /// skipped before any estimator runs.
    ///
    /// Default: `1e-10`.
    pub std_threshold: f64,

    /// A comparison needs strictly more than this many values per condition.
    ///
    /// Default: `10`.
    pub min_samples: usize,

    /// Test used when the conditions cannot be paired.
    ///
    /// Default: [`UnpairedTest::Student`].
    pub unpaired_test: UnpairedTest,

    /// How rest and task values are matched for the paired test.
    ///
    /// Default: [`PairingPolicy::SampleCount`].
    pub pairing: PairingPolicy,

    /// Directory receiving the CSV tables, figures and HTML report.
    ///
    /// Default: `results`.
    pub output_dir: PathBuf,

    /// Render `boxplots.png` and `channel_differences.png`.
    ///
    /// Default: `true`.
    pub render_plots: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            l_freq: 1.0,
            h_freq: 40.0,
            notch_freqs: vec![60.0],
            notch_trans_bandwidth: 1.0,
            average_reference: true,
            stim_channel: "STI 014".to_string(),
            exclude_bads: true,
            stimuli: StimulusKind::ALL.to_vec(),
            tmin: -0.2,
            tmax: 0.5,
            baseline: (-0.2, 0.0),
            entropy: EntropyParams::default(),
            kinds: EntropyKind::ALL.to_vec(),
            std_threshold: 1e-10,
            min_samples: 10,
            unpaired_test: UnpairedTest::Student,
            pairing: PairingPolicy::SampleCount,
            output_dir: PathBuf::from("results"),
            render_plots: true,
        }
    }
}

impl AnalysisConfig {
    /// Sample offsets `(start, stop)` of the epoch window relative to the
    /// event sample, both inclusive: `round(tmin·sfreq) ..= round(tmax·sfreq)`.
    ///
    /// ```
    /// use eeg_entropy::AnalysisConfig;
    /// let cfg = AnalysisConfig::default();
    /// assert_eq!(cfg.epoch_offsets(100.0), (-20, 50));
    /// ```
    pub fn epoch_offsets(&self, sfreq: f64) -> (i64, i64) {
        ((self.tmin * sfreq).round() as i64, (self.tmax * sfreq).round() as i64)
    }

    /// Number of samples in one epoch.
    pub fn epoch_len(&self, sfreq: f64) -> usize {
        let (start, stop) = self.epoch_offsets(sfreq);
        (stop - start + 1).max(0) as usize
    }

    /// Sample offsets of the baseline window relative to the event sample,
    /// both inclusive.
    pub fn baseline_offsets(&self, sfreq: f64) -> (i64, i64) {
        ((self.baseline.0 * sfreq).round() as i64, (self.baseline.1 * sfreq).round() as i64)
    }
}
