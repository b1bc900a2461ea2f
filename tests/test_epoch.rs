mod common;
use common::{rng, white_noise};
use eeg_entropy::events::{find_events, StimulusKind};
use eeg_entropy::{epoch_events, AnalysisConfig, Recording};
use ndarray::{s, Array1, Array2};

const SFREQ: f64 = 200.0;

/// Noise recording with a trigger trace holding step pulses of `codes` at
/// `onsets`, each 5 samples long.
fn recording(n_ch: usize, n_t: usize, onsets: &[(usize, i32)], seed: u64) -> Recording {
    let mut r = rng(seed);
    let data = Array2::from_shape_vec((n_ch, n_t), white_noise(&mut r, n_ch * n_t, 1.0)).unwrap();
    let mut stim = Array1::<f64>::zeros(n_t);
    for &(onset, code) in onsets {
        stim.slice_mut(s![onset..onset + 5]).fill(code as f64);
    }
    let names = (1..=n_ch).map(|c| format!("EEG {c:03}")).collect();
    Recording::new(names, SFREQ, data, stim).unwrap()
}

#[test]
fn epoch_count_matches_triggers() {
    let onsets = [(100, 1), (400, 3), (700, 5), (1000, 2), (1300, 32), (1600, 4)];
    let rec = recording(4, 2000, &onsets, 41);
    let cfg = AnalysisConfig::default();

    let events = find_events(&rec.stim.to_vec(), &cfg.stimuli);
    let kinds: Vec<StimulusKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![StimulusKind::AuditoryLeft, StimulusKind::VisualLeft, StimulusKind::AuditoryRight, StimulusKind::VisualRight]
    );

    let epochs = epoch_events(&rec, &events, &cfg).unwrap();
    assert_eq!(epochs.n_epochs(), 4);
    assert_eq!(epochs.data.dim(), (4, 4, 141));
    assert_eq!(epochs.start, -40);
}

#[test]
fn epoch_values_match_recording() {
    let onsets = [(300, 1), (900, 4)];
    let rec = recording(3, 1500, &onsets, 42);
    let cfg = AnalysisConfig::default();
    let events = find_events(&rec.stim.to_vec(), &cfg.stimuli);
    let epochs = epoch_events(&rec, &events, &cfg).unwrap();

    for (e, ev) in epochs.events.iter().enumerate() {
        for c in 0..3 {
            let src = rec.data.slice(s![c, ev.sample - 40..=ev.sample + 100]);
            let baseline = src.slice(s![0..=40]).mean().unwrap();
            for t in 0..epochs.n_times() {
                let got = epochs.data[[e, c, t]];
                let exp = src[t] - baseline;
                assert!((got - exp).abs() < 1e-12, "epoch={e} ch={c} t={t}: got={got:.6} expected={exp:.6}");
            }
        }
    }
}

#[test]
fn epoch_baseline_mean_is_zero() {
    let onsets = [(200, 2), (600, 3), (1000, 1)];
    let rec = recording(5, 1400, &onsets, 43);
    let cfg = AnalysisConfig::default();
    let events = find_events(&rec.stim.to_vec(), &cfg.stimuli);
    let epochs = epoch_events(&rec, &events, &cfg).unwrap();

    for e in 0..epochs.n_epochs() {
        for c in 0..epochs.n_channels() {
            let m = epochs.signal(e, c).slice(s![0..=40]).mean().unwrap();
            assert!(m.abs() < 1e-12, "epoch {e} ch {c}: baseline mean {m:.2e}");
        }
    }
}

#[test]
fn edge_events_are_dropped() {
    // 30 samples before the first onset, 60 after the last: both too close
    let onsets = [(30, 1), (500, 2), (1440, 3)];
    let rec = recording(2, 1500, &onsets, 44);
    let cfg = AnalysisConfig::default();
    let events = find_events(&rec.stim.to_vec(), &cfg.stimuli);
    assert_eq!(events.len(), 3);

    let epochs = epoch_events(&rec, &events, &cfg).unwrap();
    let kept: Vec<usize> = epochs.events.iter().map(|e| e.sample).collect();
    assert_eq!(kept, vec![500]);
}

#[test]
fn stimulus_subset_selects_epochs() {
    let onsets = [(100, 1), (400, 2), (700, 3), (1000, 4)];
    let rec = recording(2, 1300, &onsets, 45);
    let cfg = AnalysisConfig {
        stimuli: vec![StimulusKind::VisualLeft, StimulusKind::VisualRight],
        ..AnalysisConfig::default()
    };
    let events = find_events(&rec.stim.to_vec(), &cfg.stimuli);
    let epochs = epoch_events(&rec, &events, &cfg).unwrap();
    assert_eq!(epochs.n_epochs(), 2);
    assert!(epochs.events.iter().all(|e| matches!(e.kind, StimulusKind::VisualLeft | StimulusKind::VisualRight)));
}
