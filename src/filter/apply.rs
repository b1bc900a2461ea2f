//! Overlap-add zero-phase FIR convolution (MNE's `_overlap_add_filter`).
//!
//! Zero phase comes from shifting the output left by `(N−1)/2` samples, not
//! from filtfilt. Edge transients are suppressed by reflect-limited padding of
//! `N−1` samples on each side.
use std::sync::Arc;
use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView1};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// A zero-phase FIR kernel prepared for signals of one fixed length.
///
/// The FFT plans and the kernel spectrum are computed once and reused for
/// every channel.
pub struct ZeroPhaseFir {
    n_taps: usize,
    n_x:    usize,
    n_fft:  usize,
    h_fft:  Vec<Complex<f64>>,
    fwd:    Arc<dyn Fft<f64>>,
    inv:    Arc<dyn Fft<f64>>,
}

impl ZeroPhaseFir {
    /// Prepare `h` (odd length) for signals of `n_x` samples.
    pub fn new(h: &[f64], n_x: usize) -> Result<Self> {
        if h.len() % 2 == 0 {
            bail!("zero-phase FIR needs an odd number of taps, got {}", h.len());
        }
        let n_taps = h.len();
        let n_fft = choose_fft_len(n_taps, n_x + 2 * (n_taps - 1));

        let mut planner = FftPlanner::<f64>::new();
        let fwd = planner.plan_fft_forward(n_fft);
        let inv = planner.plan_fft_inverse(n_fft);

        let mut h_fft = zero_padded(h, n_fft);
        fwd.process(&mut h_fft);

        Ok(Self { n_taps, n_x, n_fft, h_fft, fwd, inv })
    }

    /// Filter one signal; the output has the same length as `x`.
    pub fn apply(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.n_x {
            bail!("filter prepared for {} samples, got {}", self.n_x, x.len());
        }
        if x.is_empty() {
            return Ok(Vec::new());
        }
        let shift = (self.n_taps - 1) / 2;
        let n_edge = self.n_taps - 1;
        let x_ext = reflect_limited_pad(x, n_edge);
        let n_ext = x_ext.len();

        let n_seg = self.n_fft - self.n_taps + 1;
        let scale = 1.0 / self.n_fft as f64;
        let mut y = vec![0.0_f64; n_ext];

        for start in (0..n_ext).step_by(n_seg) {
            let stop = (start + n_seg).min(n_ext);
            let mut buf = zero_padded(&x_ext[start..stop], self.n_fft);
            self.fwd.process(&mut buf);
            buf.iter_mut().zip(&self.h_fft).for_each(|(b, h)| *b *= *h);
            self.inv.process(&mut buf);

            // Output index o receives product index o - start + shift.
            let out_start = start.saturating_sub(shift);
            let prod_start = shift.saturating_sub(start);
            let out_end = (out_start + self.n_fft - prod_start).min(n_ext);
            for (o, p) in (out_start..out_end).zip(prod_start..) {
                y[o] += buf[p].re * scale;
            }
        }

        Ok(y[n_edge..n_edge + self.n_x].to_vec())
    }
}

/// Filter every row of `data` (`[C, T]`) in place.
pub fn apply_fir_zero_phase(data: &mut Array2<f64>, h: &[f64]) -> Result<()> {
    let fir = ZeroPhaseFir::new(h, data.ncols())?;
    for mut row in data.rows_mut() {
        let filtered = fir.apply(&row.to_vec())?;
        row.assign(&ArrayView1::from(&filtered));
    }
    Ok(())
}

/// Filter a single signal.
pub fn filter_1d(x: &[f64], h: &[f64]) -> Result<Vec<f64>> {
    ZeroPhaseFir::new(h, x.len())?.apply(x)
}

fn zero_padded(x: &[f64], n: usize) -> Vec<Complex<f64>> {
    let mut buf = vec![Complex::new(0.0, 0.0); n];
    for (b, &v) in buf.iter_mut().zip(x) {
        b.re = v;
    }
    buf
}

/// Odd reflection around the end samples (MNE's `_smart_pad`):
/// left `2·x[0] − x[i]`, right `2·x[n−1] − x[n−1−i]`. Padding beyond the
/// signal length is filled with zeros.
fn reflect_limited_pad(x: &[f64], n_pad: usize) -> Vec<f64> {
    let n = x.len();
    let reflect = n_pad.min(n - 1);
    let zeros = n_pad - reflect;
    let (first, last) = (x[0], x[n - 1]);

    let mut out = Vec::with_capacity(n + 2 * n_pad);
    out.extend(std::iter::repeat(0.0).take(zeros));
    out.extend((1..=reflect).rev().map(|i| 2.0 * first - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=reflect).map(|i| 2.0 * last - x[n - 1 - i]));
    out.extend(std::iter::repeat(0.0).take(zeros));
    out
}

/// Power-of-two FFT size minimising MNE's overlap-add cost model:
/// `ceil(n_x / (N − n_h + 1)) · N · (log2 N + 1) + 4e-5 · N · n_x`.
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;
    let max_pow = ((n_x as f64).log2().ceil() as u32 + 1).max(min_pow);

    (min_pow..=max_pow)
        .map(|pow| {
            let n = 1_usize << pow;
            let n_seg = (n - n_h + 1) as f64;
            let cost = (n_x as f64 / n_seg).ceil() * n as f64 * (pow as f64 + 1.0)
                + 4e-5 * n as f64 * n_x as f64;
            (n, cost)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n)
        .unwrap_or(1 << max_pow)
}
