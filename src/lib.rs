//! # eeg-entropy: rest vs. task entropy of event-locked EEG
//!
//! Reads the MNE "sample" recording (`sample_audvis_raw.fif`) with a native
//! FIFF reader, filters it, cuts stimulus-locked epochs and compares entropy
//! measures of the pre-stimulus (rest) and post-stimulus (task) windows.
//!
//! ## Pipeline overview
//!
//! ```text
//! sample_audvis_raw.fif
//!   │
//!   ├─ acquire::locate_sample_data()   explicit path, MNE data folders, else download
//!   ├─ recording::load_recording()     EEG picks (bads excluded) + STI 014
//!   ├─ preprocess::preprocess()        FIR 1–40 Hz, 60 Hz notch, average reference
//!   ├─ events::find_events()           rising edges, auditory/visual left/right
//!   ├─ epoch::epoch_events()           −0.2 … 0.5 s, baseline −0.2 … 0 s
//!   ├─ table::build_table()            rest (t < 0) / task (t > 0) windows
//!   │     └─ entropy::compute()        shannon, sample, permutation, weber_fechner
//!   ├─ stats::compare()                paired / Student / Welch t, Cohen's d
//!   └─ pipeline::write_outputs()       CSV, PNG, HTML
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use eeg_entropy::acquire::{locate_sample_data, DEFAULT_DOWNLOAD_TIMEOUT};
//! use eeg_entropy::{pipeline, AnalysisConfig};
//!
//! let cfg = AnalysisConfig::default();
//! let path = locate_sample_data(None, DEFAULT_DOWNLOAD_TIMEOUT)?;
//! let analysis = pipeline::analyze_file(&path, &cfg)?;
//! for r in &analysis.comparison.results {
//!     println!("{}: t = {:.2}, p = {:.3} {}", r.kind, r.t_stat, r.p_value, r.tier);
//! }
//! pipeline::write_outputs(&analysis, &cfg)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use eeg_entropy::entropy::{compute, EntropyKind, EntropyParams};
//!
//! let segment: Vec<f64> = (0..300).map(|i| (i as f64 * 0.3).sin()).collect();
//! let set = compute(&segment, &EntropyKind::ALL, &EntropyParams::default())?;
//! println!("permutation entropy: {:?}", set.get(EntropyKind::Permutation));
//! # Ok::<(), eeg_entropy::entropy::EntropyError>(())
//! ```

pub mod acquire;
pub mod config;
pub mod entropy;
pub mod epoch;
pub mod events;
pub mod fiff;
pub mod filter;
pub mod io;
pub mod pipeline;
pub mod plot;
pub mod preprocess;
pub mod recording;
pub mod reference;
pub mod report;
pub mod stats;
pub mod table;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::AnalysisConfig;

// acquisition + recording
pub use acquire::{download_sample_data, locate_sample_data, AcquisitionError};
pub use recording::{load_recording, Recording};

// preprocessing
pub use preprocess::preprocess;
pub use reference::average_reference_inplace;
pub use events::{find_events, Event, StimulusKind};
pub use epoch::{epoch_events, Epochs};

// entropy engine
pub use entropy::{EntropyError, EntropyKind, EntropyParams, EntropySet};
pub use table::{build_table, Condition, EntropyRecord, EntropyTable};

// statistics
pub use stats::{
    compare, cohens_d, Comparison, ComparisonResult, ComparisonSkip,
    PairingPolicy, Significance, TestKind, UnpairedTest,
};

// fiff
pub use fiff::{open_raw, ChannelInfo, ChannelKind, MeasInfo, RawFif};
