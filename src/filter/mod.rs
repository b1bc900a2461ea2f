//! FIR filter design and application.
//!
//! - [`design`]: Hamming-windowed sinc band-pass and notch kernels following
//!   `mne.filter.create_filter(fir_window='hamming', fir_design='firwin')`.
//! - [`apply`]: overlap-add zero-phase convolution, following MNE's
//!   `_overlap_add_filter`.

pub mod apply;
pub mod design;

pub use apply::{apply_fir_zero_phase, filter_1d, ZeroPhaseFir};
pub use design::{
    auto_filter_length, auto_trans_bandwidth_high, auto_trans_bandwidth_low,
    design_bandpass, design_notch, firwin_lowpass, hamming,
};
