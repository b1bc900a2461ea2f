//! Average reference: subtract the across-channel mean at every time point.
//!
//! Equivalent to applying the average-EEG-reference projector that ships with
//! the MNE sample recording. `data`: `[C, T]`, `data[c, t] -= mean(data[:, t])`.
use ndarray::{Array2, Axis};

/// Re-reference in place. A recording without channels is left untouched.
pub fn average_reference_inplace(data: &mut Array2<f64>) {
    let Some(means) = data.mean_axis(Axis(0)) else { return };
    for mut row in data.rows_mut() {
        row -= &means;
    }
}
