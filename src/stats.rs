//! Rest vs. task comparison per entropy kind.
//!
//! For every kind with enough values on both sides the comparator reports
//! descriptive statistics (mean, ddof = 1 std), a two-sided t-test and
//! Cohen's d. The t statistic and d are both oriented as `rest − task`.
//!
//! Test selection depends on [`PairingPolicy`]:
//!
//! - [`PairingPolicy::SampleCount`]: paired test whenever both sides have the
//!   same number of values, pairing them in table order. Mismatched segment
//!   keys are reported with a warning.
//! - [`PairingPolicy::MatchedKeys`]: paired test only when both sides hold
//!   exactly the same `(epoch, channel)` segments, aligned by key.
//!
//! Otherwise an independent-samples test is used ([`UnpairedTest`]).
use std::collections::BTreeMap;
use std::fmt;

use anyhow::{anyhow, Result};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::entropy::EntropyKind;
use crate::table::{Condition, EntropyRecord, EntropyTable};

/// Significance level for the `significant` flag.
pub const ALPHA: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingPolicy {
    SampleCount,
    MatchedKeys,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpairedTest {
    /// Pooled-variance Student's t-test.
    Student,
    /// Welch's unequal-variance t-test.
    Welch,
}

/// The test actually applied to a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    Paired,
    Student,
    Welch,
}

impl TestKind {
    pub fn name(self) -> &'static str {
        match self {
            TestKind::Paired  => "paired t-test",
            TestKind::Student => "independent t-test",
            TestKind::Welch   => "Welch t-test",
        }
    }
}

impl From<UnpairedTest> for TestKind {
    fn from(t: UnpairedTest) -> Self {
        match t {
            UnpairedTest::Student => TestKind::Student,
            UnpairedTest::Welch   => TestKind::Welch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Significance {
    NotSignificant,
    /// p < 0.05
    Low,
    /// p < 0.01
    Medium,
    /// p < 0.001
    High,
}

impl Significance {
    pub fn from_p(p: f64) -> Self {
        if p < 0.001 {
            Significance::High
        } else if p < 0.01 {
            Significance::Medium
        } else if p < ALPHA {
            Significance::Low
        } else {
            Significance::NotSignificant
        }
    }

    pub fn stars(self) -> &'static str {
        match self {
            Significance::High           => "***",
            Significance::Medium         => "**",
            Significance::Low            => "*",
            Significance::NotSignificant => "ns",
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stars())
    }
}

/// Outcome of a two-sided t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub t:  f64,
    pub df: f64,
    pub p:  f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub kind:        EntropyKind,
    pub rest_mean:   f64,
    pub rest_std:    f64,
    pub task_mean:   f64,
    pub task_std:    f64,
    pub n_rest:      usize,
    pub n_task:      usize,
    pub test:        TestKind,
    pub t_stat:      f64,
    pub p_value:     f64,
    pub significant: bool,
    pub tier:        Significance,
    /// Cohen's d, `rest − task` over the pooled std.
    pub effect_size: f64,
}

/// A kind left out of the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonSkip {
    InsufficientData { kind: EntropyKind, n_rest: usize, n_task: usize },
}

impl fmt::Display for ComparisonSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonSkip::InsufficientData { kind, n_rest, n_task } => write!(
                f,
                "{kind}: insufficient data (rest n = {n_rest}, task n = {n_task})"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub results: Vec<ComparisonResult>,
    pub skips:   Vec<ComparisonSkip>,
}

impl Comparison {
    pub fn result(&self, kind: EntropyKind) -> Option<&ComparisonResult> {
        self.results.iter().find(|r| r.kind == kind)
    }
}

pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Sample variance (ddof = 1); `NaN` below two values.
pub fn sample_variance(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return f64::NAN;
    }
    let m = mean(x);
    x.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (x.len() - 1) as f64
}

pub fn sample_std(x: &[f64]) -> f64 {
    sample_variance(x).sqrt()
}

fn pooled_variance(a: &[f64], b: &[f64]) -> f64 {
    let (na, nb) = (a.len() as f64, b.len() as f64);
    ((na - 1.0) * sample_variance(a) + (nb - 1.0) * sample_variance(b)) / (na + nb - 2.0)
}

/// Cohen's d of `a − b` with the pooled (ddof = 1) standard deviation; `0.0`
/// when the pooled std is zero.
///
/// ```
/// use eeg_entropy::stats::cohens_d;
/// let a = [1.0, 2.0, 3.0];
/// let b = [2.0, 3.0, 4.0];
/// assert_eq!(cohens_d(&a, &b), -1.0);
/// assert_eq!(cohens_d(&b, &a), 1.0);
/// ```
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    let pooled = pooled_variance(a, b).sqrt();
    if pooled == 0.0 || !pooled.is_finite() {
        return 0.0;
    }
    (mean(a) - mean(b)) / pooled
}

/// Two-sided test of `diff / se` against Student-t with `df` degrees of
/// freedom. A zero standard error gives `t = 0, p = 1` for a zero difference
/// and `t = ±∞, p = 0` otherwise.
fn t_test(diff: f64, se: f64, df: f64) -> Result<TTest> {
    if se == 0.0 {
        return Ok(if diff == 0.0 {
            TTest { t: 0.0, df, p: 1.0 }
        } else {
            TTest { t: diff.signum() * f64::INFINITY, df, p: 0.0 }
        });
    }
    let t = diff / se;
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| anyhow!("Student-t with {df} degrees of freedom: {e}"))?;
    let p = (2.0 * dist.sf(t.abs())).min(1.0);
    Ok(TTest { t, df, p })
}

/// Paired t-test of `a − b`; both slices must have the same length ≥ 2.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> Result<TTest> {
    if a.len() != b.len() || a.len() < 2 {
        return Err(anyhow!("paired t-test needs two equal samples of ≥ 2 values, got {} and {}", a.len(), b.len()));
    }
    let d: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let n = d.len() as f64;
    t_test(mean(&d), sample_std(&d) / n.sqrt(), n - 1.0)
}

/// Student's pooled-variance t-test of `a` against `b`.
pub fn student_t_test(a: &[f64], b: &[f64]) -> Result<TTest> {
    if a.len() < 2 || b.len() < 2 {
        return Err(anyhow!("t-test needs ≥ 2 values per sample, got {} and {}", a.len(), b.len()));
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let se = (pooled_variance(a, b) * (1.0 / na + 1.0 / nb)).sqrt();
    t_test(mean(a) - mean(b), se, na + nb - 2.0)
}

/// Welch's t-test with Welch–Satterthwaite degrees of freedom.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TTest> {
    if a.len() < 2 || b.len() < 2 {
        return Err(anyhow!("t-test needs ≥ 2 values per sample, got {} and {}", a.len(), b.len()));
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (qa, qb) = (sample_variance(a) / na, sample_variance(b) / nb);
    let se = (qa + qb).sqrt();
    let df = if se == 0.0 {
        na + nb - 2.0
    } else {
        (qa + qb).powi(2) / (qa * qa / (na - 1.0) + qb * qb / (nb - 1.0))
    };
    t_test(mean(a) - mean(b), se, df)
}

/// Rest and task values aligned by `(epoch, channel)`, or `None` when the two
/// sides do not hold the same set of segments.
fn align_by_key(rest: &[&EntropyRecord], task: &[&EntropyRecord]) -> Option<(Vec<f64>, Vec<f64>)> {
    let r: BTreeMap<_, _> = rest.iter().map(|rec| (rec.key(), rec.value)).collect();
    let t: BTreeMap<_, _> = task.iter().map(|rec| (rec.key(), rec.value)).collect();
    if r.len() != rest.len() || t.len() != task.len() || !r.keys().eq(t.keys()) {
        return None;
    }
    Some((r.into_values().collect(), t.into_values().collect()))
}

fn same_keys(rest: &[&EntropyRecord], task: &[&EntropyRecord]) -> bool {
    let mut r: Vec<_> = rest.iter().map(|rec| rec.key()).collect();
    let mut t: Vec<_> = task.iter().map(|rec| rec.key()).collect();
    r.sort_unstable();
    t.sort_unstable();
    r == t
}

/// Compare one kind; `Ok(Err(skip))` when a side has too few values.
pub fn compare_kind(
    table: &EntropyTable,
    kind: EntropyKind,
    cfg: &AnalysisConfig,
) -> Result<std::result::Result<ComparisonResult, ComparisonSkip>> {
    let rest: Vec<&EntropyRecord> = table.select(kind, Condition::Rest).collect();
    let task: Vec<&EntropyRecord> = table.select(kind, Condition::Task).collect();
    let (n_rest, n_task) = (rest.len(), task.len());
    if n_rest <= cfg.min_samples || n_task <= cfg.min_samples {
        return Ok(Err(ComparisonSkip::InsufficientData { kind, n_rest, n_task }));
    }

    let rest_values: Vec<f64> = rest.iter().map(|r| r.value).collect();
    let task_values: Vec<f64> = task.iter().map(|r| r.value).collect();

    let paired = match cfg.pairing {
        PairingPolicy::SampleCount if n_rest == n_task => {
            if !same_keys(&rest, &task) {
                warn!(
                    %kind,
                    n = n_rest,
                    "equal counts but different (epoch, channel) segments; pairing by table order"
                );
            }
            Some((rest_values.clone(), task_values.clone()))
        }
        PairingPolicy::SampleCount => None,
        PairingPolicy::MatchedKeys => align_by_key(&rest, &task),
    };

    let (test, tt) = match &paired {
        Some((r, t)) => (TestKind::Paired, paired_t_test(r, t)?),
        None => {
            let test = TestKind::from(cfg.unpaired_test);
            let tt = match cfg.unpaired_test {
                UnpairedTest::Student => student_t_test(&rest_values, &task_values)?,
                UnpairedTest::Welch   => welch_t_test(&rest_values, &task_values)?,
            };
            (test, tt)
        }
    };

    Ok(Ok(ComparisonResult {
        kind,
        rest_mean: mean(&rest_values),
        rest_std: sample_std(&rest_values),
        task_mean: mean(&task_values),
        task_std: sample_std(&task_values),
        n_rest,
        n_task,
        test,
        t_stat: tt.t,
        p_value: tt.p,
        significant: tt.p < ALPHA,
        tier: Significance::from_p(tt.p),
        effect_size: cohens_d(&rest_values, &task_values),
    }))
}

/// Compare rest and task for every configured kind.
pub fn compare(table: &EntropyTable, cfg: &AnalysisConfig) -> Result<Comparison> {
    let mut out = Comparison::default();
    for &kind in &cfg.kinds {
        match compare_kind(table, kind, cfg)? {
            Ok(res) => {
                info!(
                    %kind,
                    test = res.test.name(),
                    t = res.t_stat,
                    p = res.p_value,
                    d = res.effect_size,
                    "compared rest vs task"
                );
                out.results.push(res);
            }
            Err(skip) => {
                warn!("{skip}");
                out.skips.push(skip);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn tiers() {
        assert_eq!(Significance::from_p(0.0005).stars(), "***");
        assert_eq!(Significance::from_p(0.001).stars(), "**");
        assert_eq!(Significance::from_p(0.009).stars(), "**");
        assert_eq!(Significance::from_p(0.01).stars(), "*");
        assert_eq!(Significance::from_p(0.049).stars(), "*");
        assert_eq!(Significance::from_p(0.05).stars(), "ns");
        assert_eq!(Significance::from_p(0.7).stars(), "ns");
    }

    #[test]
    fn sample_std_uses_ddof_one() {
        assert_abs_diff_eq!(sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), (32.0_f64 / 7.0).sqrt());
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn paired_t_matches_reference_values() {
        // differences [-1, 0, -1, -1, -2]: mean -1, sd sqrt(0.5), t = -sqrt(10)
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 2.0, 4.0, 5.0, 7.0];
        let tt = paired_t_test(&a, &b).unwrap();
        assert_abs_diff_eq!(tt.t, -10f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(tt.df, 4.0);
        assert_abs_diff_eq!(tt.p, 0.03411, epsilon = 1e-4);
    }

    #[test]
    fn student_t_matches_reference_values() {
        // equal variances: t = (2 − 5) / sqrt(1·(1/3 + 1/3)) with df = 4
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let tt = student_t_test(&a, &b).unwrap();
        assert_abs_diff_eq!(tt.t, -3.0 / (2.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(tt.df, 4.0);
        assert_abs_diff_eq!(tt.p, 0.02131, epsilon = 1e-4);
    }

    #[test]
    fn welch_equals_student_for_equal_sizes_and_variances() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [3.0, 4.0, 5.0, 6.0];
        let s = student_t_test(&a, &b).unwrap();
        let w = welch_t_test(&a, &b).unwrap();
        assert_abs_diff_eq!(s.t, w.t, epsilon = 1e-12);
        assert_abs_diff_eq!(s.df, w.df, epsilon = 1e-12);
        assert_abs_diff_eq!(s.p, w.p, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_differences() {
        let a = [1.0, 2.0, 3.0];
        let same = paired_t_test(&a, &a).unwrap();
        assert_eq!((same.t, same.p), (0.0, 1.0));
        let shifted = paired_t_test(&[2.0, 3.0, 4.0], &a).unwrap();
        assert_eq!((shifted.t, shifted.p), (f64::INFINITY, 0.0));
        let flat = student_t_test(&[1.0; 3], &[2.0; 3]).unwrap();
        assert_eq!((flat.t, flat.p), (f64::NEG_INFINITY, 0.0));
    }

    #[test]
    fn cohens_d_is_antisymmetric() {
        let a = [0.3, 1.2, 2.2, 0.9, 1.7];
        let b = [2.0, 2.5, 1.1, 3.0];
        assert_abs_diff_eq!(cohens_d(&a, &b), -cohens_d(&b, &a), epsilon = 1e-15);
        assert_eq!(cohens_d(&[1.0; 4], &[1.0; 4]), 0.0);
    }

    #[test]
    fn t_tests_reject_tiny_samples() {
        assert!(paired_t_test(&[1.0], &[2.0]).is_err());
        assert!(paired_t_test(&[1.0, 2.0], &[2.0]).is_err());
        assert!(student_t_test(&[1.0], &[2.0, 3.0]).is_err());
    }
}
