//! Continuous-data preprocessing: band-pass, line-noise notches and average
//! reference, applied in that order.
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::filter::{apply_fir_zero_phase, design_bandpass, design_notch};
use crate::recording::Recording;
use crate::reference::average_reference_inplace;

/// Filter and re-reference `rec`, returning a new recording.
///
/// Notch frequencies at or above Nyquist are skipped. The trigger trace is
/// carried over untouched.
pub fn preprocess(rec: &Recording, cfg: &AnalysisConfig) -> Result<Recording> {
    let mut data = rec.data.clone();

    let h = design_bandpass(cfg.l_freq, cfg.h_freq, rec.sfreq)
        .context("design band-pass")?;
    debug!(taps = h.len(), l_freq = cfg.l_freq, h_freq = cfg.h_freq, "band-pass");
    apply_fir_zero_phase(&mut data, &h)?;

    let nyquist = rec.sfreq / 2.0;
    for &freq in &cfg.notch_freqs {
        if freq >= nyquist {
            debug!(freq, nyquist, "notch above Nyquist skipped");
            continue;
        }
        let h = design_notch(freq, cfg.notch_trans_bandwidth, rec.sfreq)
            .with_context(|| format!("design {freq} Hz notch"))?;
        debug!(taps = h.len(), freq, "notch");
        apply_fir_zero_phase(&mut data, &h)?;
    }

    if cfg.average_reference {
        average_reference_inplace(&mut data);
    }

    info!(
        l_freq = cfg.l_freq,
        h_freq = cfg.h_freq,
        notches = ?cfg.notch_freqs,
        average_reference = cfg.average_reference,
        "preprocessed"
    );
    rec.with_data(data)
}
