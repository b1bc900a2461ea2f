//! Entropy and complexity estimators for a single-channel segment.
//!
//! | kind            | estimator                                                  |
//! |-----------------|------------------------------------------------------------|
//! | `shannon`       | `−Σ p ln p` over a fixed-bin histogram on `[min, max]`     |
//! | `sample`        | SampEn(m, r·σ), Chebyshev distance, strict `< r` matching  |
//! | `permutation`   | ordinal-pattern entropy normalised by `ln(order!)`         |
//! | `weber_fechner` | `ln(σ² + 1e-10)`                                           |
//!
//! σ is always the population standard deviation. Callers are expected to
//! skip near-constant segments before estimating; the estimators themselves
//! only guard against outputs that are not finite.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Offset keeping the Weber–Fechner log finite for zero-variance input.
pub const WEBER_FECHNER_EPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntropyKind {
    Shannon,
    Sample,
    Permutation,
    WeberFechner,
}

impl EntropyKind {
    pub const ALL: [EntropyKind; 4] = [
        EntropyKind::Shannon,
        EntropyKind::Sample,
        EntropyKind::Permutation,
        EntropyKind::WeberFechner,
    ];

    /// Name used in the CSV tables and the report.
    pub fn name(self) -> &'static str {
        match self {
            EntropyKind::Shannon      => "shannon",
            EntropyKind::Sample       => "sample",
            EntropyKind::Permutation  => "permutation",
            EntropyKind::WeberFechner => "weber_fechner",
        }
    }
}

impl fmt::Display for EntropyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntropyKind {
    type Err = EntropyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntropyKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| EntropyError::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EntropyError {
    #[error("{kind} entropy needs at least {needed} samples, got {got}")]
    TooShort { kind: EntropyKind, needed: usize, got: usize },

    #[error("{kind} entropy is not finite ({value})")]
    NonFinite { kind: EntropyKind, value: f64 },

    #[error("invalid {kind} parameters: {reason}")]
    InvalidParams { kind: EntropyKind, reason: String },

    #[error("unknown entropy kind {0:?}")]
    UnknownKind(String),
}

/// Estimator parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EntropyParams {
    /// Histogram bins for Shannon entropy.
    pub histogram_bins:   usize,
    /// Embedding dimension `m` of sample entropy.
    pub sampen_order:     usize,
    /// Tolerance of sample entropy as a fraction of the segment's std.
    pub sampen_tolerance: f64,
    /// Ordinal pattern length of permutation entropy.
    pub perm_order:       usize,
    /// Lag between pattern elements of permutation entropy.
    pub perm_delay:       usize,
}

impl Default for EntropyParams {
    fn default() -> Self {
        Self {
            histogram_bins:   50,
            sampen_order:     2,
            sampen_tolerance: 0.2,
            perm_order:       3,
            perm_delay:       1,
        }
    }
}

/// One value per requested kind, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntropySet {
    pub values: Vec<(EntropyKind, f64)>,
}

impl EntropySet {
    pub fn get(&self, kind: EntropyKind) -> Option<f64> {
        self.values.iter().find(|(k, _)| *k == kind).map(|&(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntropyKind, f64)> + '_ {
        self.values.iter().copied()
    }
}

pub(crate) fn mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

/// Population variance (ddof = 0).
pub fn population_variance(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let m = mean(x);
    x.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / x.len() as f64
}

/// Population standard deviation (ddof = 0).
pub fn population_std(x: &[f64]) -> f64 {
    population_variance(x).sqrt()
}

/// Shannon entropy (nats) of a `bins`-bin histogram spanning `[min, max]`.
///
/// The last bin is closed on the right, like `numpy.histogram`. A constant
/// segment falls into a single bin and has zero entropy.
///
/// ```
/// use eeg_entropy::entropy::shannon_entropy;
/// let h = shannon_entropy(&[0.0, 1.0, 2.0, 3.0], 2);
/// assert!((h - std::f64::consts::LN_2).abs() < 1e-12);
/// ```
pub fn shannon_entropy(x: &[f64], bins: usize) -> f64 {
    if x.is_empty() || bins == 0 {
        return 0.0;
    }
    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (hi - lo) / bins as f64;
    if !(width > 0.0) {
        return 0.0;
    }

    let mut counts = vec![0_usize; bins];
    for &v in x {
        let bin = (((v - lo) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    let total = counts.iter().sum::<usize>() as f64;
    if total == 0.0 {
        return 0.0;
    }
    -counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Number of template pairs `i < j` whose first `len` samples all differ by
/// less than `r`, over the templates starting at `0..n_templates`.
fn count_similar_pairs(x: &[f64], len: usize, n_templates: usize, r: f64) -> u64 {
    let mut count = 0;
    for i in 0..n_templates {
        for j in i + 1..n_templates {
            if (0..len).all(|k| (x[i + k] - x[j + k]).abs() < r) {
                count += 1;
            }
        }
    }
    count
}

/// Sample entropy `−ln(A/B)` with tolerance `tolerance · σ`.
///
/// `B` counts similar template pairs of length `m`, `A` of length `m + 1`,
/// both over the first `N − m` templates so the two counts are comparable.
/// Without a similar `m`-pair (`B = 0`) the ratio is `0/0` and the result is
/// `NaN`; similar `m`-pairs without a single similar `(m+1)`-pair give `+∞`.
/// [`estimate`] reports both as [`EntropyError::NonFinite`].
pub fn sample_entropy(x: &[f64], m: usize, tolerance: f64) -> Result<f64, EntropyError> {
    let kind = EntropyKind::Sample;
    if m == 0 {
        return Err(EntropyError::InvalidParams { kind, reason: "embedding dimension must be ≥ 1".into() });
    }
    if x.len() < m + 2 {
        return Err(EntropyError::TooShort { kind, needed: m + 2, got: x.len() });
    }
    let r = tolerance * population_std(x);
    let n_templates = x.len() - m;

    let b = count_similar_pairs(x, m, n_templates, r);
    if b == 0 {
        return Ok(f64::NAN);
    }
    let a = count_similar_pairs(x, m + 1, n_templates, r);
    if a == 0 {
        return Ok(f64::INFINITY);
    }
    Ok(-(a as f64 / b as f64).ln())
}

/// Argsort of the pattern starting at `start`; ties keep their position order.
fn ordinal_pattern(x: &[f64], start: usize, order: usize, delay: usize) -> Vec<u8> {
    let mut idx: Vec<usize> = (0..order).collect();
    idx.sort_by(|&a, &b| x[start + a * delay].total_cmp(&x[start + b * delay]));
    idx.into_iter().map(|i| i as u8).collect()
}

/// Permutation entropy normalised to `[0, 1]` by `ln(order!)`.
pub fn permutation_entropy(x: &[f64], order: usize, delay: usize) -> Result<f64, EntropyError> {
    let kind = EntropyKind::Permutation;
    if !(2..=u8::MAX as usize).contains(&order) || delay == 0 {
        return Err(EntropyError::InvalidParams {
            kind,
            reason: format!("order {order} and delay {delay} must satisfy order ≥ 2, delay ≥ 1"),
        });
    }
    let span = (order - 1) * delay;
    if x.len() <= span {
        return Err(EntropyError::TooShort { kind, needed: span + 1, got: x.len() });
    }
    let n_patterns = x.len() - span;

    let mut counts: HashMap<Vec<u8>, usize> = HashMap::new();
    for start in 0..n_patterns {
        *counts.entry(ordinal_pattern(x, start, order, delay)).or_insert(0) += 1;
    }

    let h: f64 = -counts
        .values()
        .map(|&c| {
            let p = c as f64 / n_patterns as f64;
            p * p.ln()
        })
        .sum::<f64>();
    let h_max = (1..=order).map(|k| (k as f64).ln()).sum::<f64>();
    Ok(h / h_max)
}

/// `ln(σ² + 1e-10)`: log-compressed signal power.
pub fn weber_fechner(x: &[f64]) -> f64 {
    (population_variance(x) + WEBER_FECHNER_EPS).ln()
}

/// Estimate a single kind.
pub fn estimate(x: &[f64], kind: EntropyKind, params: &EntropyParams) -> Result<f64, EntropyError> {
    let value = match kind {
        EntropyKind::Shannon      => shannon_entropy(x, params.histogram_bins),
        EntropyKind::Sample       => sample_entropy(x, params.sampen_order, params.sampen_tolerance)?,
        EntropyKind::Permutation  => permutation_entropy(x, params.perm_order, params.perm_delay)?,
        EntropyKind::WeberFechner => weber_fechner(x),
    };
    if !value.is_finite() {
        return Err(EntropyError::NonFinite { kind, value });
    }
    Ok(value)
}

/// Estimate every kind in `kinds`; the first failing kind aborts the segment.
pub fn compute(x: &[f64], kinds: &[EntropyKind], params: &EntropyParams) -> Result<EntropySet, EntropyError> {
    let values = kinds
        .iter()
        .map(|&k| estimate(x, k, params).map(|v| (k, v)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EntropySet { values })
}
