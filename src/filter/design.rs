//! Windowed-sinc FIR design following MNE's `fir_design='firwin'` defaults.
//!
//! - transition bandwidth (low edge)  = `min(max(0.25·l_freq, 2), l_freq)`
//! - transition bandwidth (high edge) = `min(max(0.25·h_freq, 2), nyquist − h_freq)`
//! - filter length = `ceil(3.3 / trans_bw · sfreq)`, rounded up to odd
//! - Hamming window, cutoffs (−6 dB points) at the middle of each transition band
//!
//! Band-pass and band-stop kernels are built from two lowpass kernels of the
//! same length, so all designs are symmetric (linear phase, zero phase once
//! the group delay is removed by [`super::apply`]).
use std::f64::consts::PI;
use anyhow::{bail, Result};

/// Transition bandwidth for the lower edge of a band-pass.
pub fn auto_trans_bandwidth_low(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Transition bandwidth for the upper edge of a band-pass.
pub fn auto_trans_bandwidth_high(h_freq: f64, sfreq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of taps for a transition bandwidth, always odd.
pub fn auto_filter_length(trans_bw: f64, sfreq: f64) -> usize {
    let n = (3.3 / trans_bw * sfreq).ceil() as usize;
    n | 1
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Hamming-windowed sinc lowpass with unit DC gain; `n` must be odd.
pub fn firwin_lowpass(n: usize, cutoff_hz: f64, sfreq: f64) -> Vec<f64> {
    debug_assert!(n % 2 == 1, "linear-phase design needs an odd length");
    let centre = (n - 1) as f64 / 2.0;
    let fc = cutoff_hz / (sfreq / 2.0);
    let mut h: Vec<f64> = hamming(n)
        .into_iter()
        .enumerate()
        .map(|(i, w)| {
            let x = i as f64 - centre;
            // sin(π·fc·x) / (π·x), with the limit fc at x = 0
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * w
        })
        .collect();
    let dc: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= dc);
    h
}

/// Zero-phase band-pass between `l_freq` and `h_freq`.
///
/// ```
/// use eeg_entropy::filter::design_bandpass;
/// let h = design_bandpass(1.0, 40.0, 600.0).unwrap();
/// assert_eq!(h.len() % 2, 1);
/// assert!(h.iter().sum::<f64>().abs() < 1e-6); // no DC
/// ```
pub fn design_bandpass(l_freq: f64, h_freq: f64, sfreq: f64) -> Result<Vec<f64>> {
    let nyq = sfreq / 2.0;
    if !(l_freq > 0.0 && l_freq < h_freq && h_freq < nyq) {
        bail!("invalid band-pass {l_freq}–{h_freq} Hz at sfreq {sfreq} Hz");
    }
    let l_trans = auto_trans_bandwidth_low(l_freq);
    let h_trans = auto_trans_bandwidth_high(h_freq, sfreq);
    let n = auto_filter_length(l_trans.min(h_trans), sfreq);

    let upper = firwin_lowpass(n, h_freq + h_trans / 2.0, sfreq);
    let lower = firwin_lowpass(n, l_freq - l_trans / 2.0, sfreq);
    Ok(upper.iter().zip(&lower).map(|(u, l)| u - l).collect())
}

/// Zero-phase band-stop centred on `freq` (line-noise notch).
///
/// The stop band is `freq ± freq/200`; each side has a transition band of
/// `trans_bw / 2` Hz.
pub fn design_notch(freq: f64, trans_bw: f64, sfreq: f64) -> Result<Vec<f64>> {
    let half_width = freq / 400.0;
    let half_trans = trans_bw / 2.0;
    let lo = freq - half_width - half_trans / 2.0;
    let hi = freq + half_width + half_trans / 2.0;
    if !(trans_bw > 0.0 && lo > 0.0 && hi < sfreq / 2.0) {
        bail!("invalid notch at {freq} Hz (trans {trans_bw} Hz) for sfreq {sfreq} Hz");
    }
    let n = auto_filter_length(half_trans, sfreq);
    let upper = firwin_lowpass(n, hi, sfreq);
    let lower = firwin_lowpass(n, lo, sfreq);

    // delta − band-pass(lo, hi)
    let mut h: Vec<f64> = upper.iter().zip(&lower).map(|(u, l)| l - u).collect();
    h[n / 2] += 1.0;
    Ok(h)
}
