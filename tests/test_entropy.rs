mod common;
use common::{regular_signal, rest_task_epochs, rng, white_noise};
use eeg_entropy::entropy::{
    compute, permutation_entropy, sample_entropy, shannon_entropy, weber_fechner, EntropyKind,
    EntropyParams,
};
use eeg_entropy::epoch::from_arrays;
use eeg_entropy::events::{Event, StimulusKind};
use eeg_entropy::table::{build_table, Condition};
use eeg_entropy::AnalysisConfig;
use ndarray::Array2;

// ── Estimator properties ─────────────────────────────────────────────────────

#[test]
fn permutation_entropy_stays_in_unit_interval() {
    let mut r = rng(11);
    for n in [10, 50, 200, 700] {
        for signal in [white_noise(&mut r, n, 1.0), regular_signal(&mut r, n, 7.0, 250.0, 0.01)] {
            let p = permutation_entropy(&signal, 3, 1).unwrap();
            assert!((0.0..=1.0).contains(&p), "n = {n}: {p}");
        }
    }
}

#[test]
fn shannon_entropy_is_non_negative() {
    let mut r = rng(12);
    for n in [1, 2, 49, 50, 51, 500] {
        let h = shannon_entropy(&white_noise(&mut r, n, 3.0), 50);
        assert!(h >= 0.0, "n = {n}: {h}");
        assert!(h <= 50f64.ln() + 1e-12);
    }
}

#[test]
fn regular_signals_have_lower_entropy_than_noise() {
    let mut r = rng(13);
    let noise = white_noise(&mut r, 500, 1.0);
    let regular = regular_signal(&mut r, 500, 5.0, 1000.0, 1e-3);

    let se_noise = sample_entropy(&noise, 2, 0.2).unwrap();
    let se_regular = sample_entropy(&regular, 2, 0.2).unwrap();
    assert!(se_regular < se_noise, "{se_regular} !< {se_noise}");

    let pe_noise = permutation_entropy(&noise, 3, 1).unwrap();
    let pe_regular = permutation_entropy(&regular, 3, 1).unwrap();
    assert!(pe_regular < 0.6 && pe_noise > 0.9, "{pe_regular} / {pe_noise}");
}

#[test]
fn weber_fechner_tracks_log_power() {
    let x: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 2.0 } else { -2.0 }).collect();
    approx::assert_abs_diff_eq!(weber_fechner(&x), (4.0_f64 + 1e-10).ln(), epsilon = 1e-12);
    let y: Vec<f64> = x.iter().map(|v| v * 10.0).collect();
    approx::assert_abs_diff_eq!(weber_fechner(&y) - weber_fechner(&x), 100f64.ln(), epsilon = 1e-9);
}

#[test]
fn every_value_is_finite() {
    let mut r = rng(14);
    let set = compute(&white_noise(&mut r, 300, 1.0), &EntropyKind::ALL, &EntropyParams::default()).unwrap();
    assert_eq!(set.values.len(), 4);
    assert!(set.iter().all(|(_, v)| v.is_finite()));
}

// ── Table builder ────────────────────────────────────────────────────────────

#[test]
fn constant_segments_never_reach_the_engine() {
    // Constant windows would make sample entropy's tolerance zero; they must
    // be counted as skipped instead of producing values or errors.
    let sfreq = 1000.0;
    let mut r = rng(15);
    let mut ep = Array2::<f64>::zeros((3, 701));
    // ch 0: constant everywhere; ch 1: noise rest, constant task; ch 2: noise
    for t in 0..701 {
        ep[[0, t]] = 4.2;
    }
    for (t, v) in white_noise(&mut r, 200, 1.0).into_iter().enumerate() {
        ep[[1, t]] = v;
    }
    for t in 200..701 {
        ep[[1, t]] = -1.0;
    }
    for (t, v) in white_noise(&mut r, 701, 1.0).into_iter().enumerate() {
        ep[[2, t]] = v;
    }
    let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    let ev = Event { sample: 500, kind: StimulusKind::AuditoryRight };
    let epochs = from_arrays(vec![ep], vec![ev], names, sfreq, -200).unwrap();

    let table = build_table(&epochs, &AnalysisConfig::default()).unwrap();
    assert_eq!(table.skipped_segments, 3);
    let kinds = EntropyKind::ALL.len();
    assert_eq!(table.records.len(), 3 * kinds);
    assert!(table.records.iter().all(|r| r.channel != 0));
    assert!(table
        .records
        .iter()
        .filter(|r| r.channel == 1)
        .all(|r| r.condition == Condition::Rest));
}

#[test]
fn table_has_one_record_per_window_and_kind() {
    let epochs = rest_task_epochs(3, 2, 16);
    let table = build_table(&epochs, &AnalysisConfig::default()).unwrap();
    assert_eq!(table.skipped_segments, 0);
    assert_eq!(table.records.len(), 3 * 2 * 2 * 4);
    for kind in EntropyKind::ALL {
        assert_eq!(table.values(kind, Condition::Rest).len(), 6);
        assert_eq!(table.values(kind, Condition::Task).len(), 6);
    }
}
