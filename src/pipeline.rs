//! Stage-by-stage driver.
//!
//! ```text
//! locate_sample_data ─→ load_recording ─→ preprocess ─→ find_events ─→ epoch_events
//!                                                                         │
//!        write_outputs ←─ compare ←─ build_table ←───────────────────────┘
//! ```
//!
//! Each stage takes its inputs as arguments and returns its output; nothing
//! is shared between stages except through these values.
use std::path::Path;
use anyhow::{Context, Result};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::epoch::{epoch_events, Epochs};
use crate::events::{find_events, Event};
use crate::io::{write_entropy_values, write_statistical_results, ENTROPY_VALUES_CSV, STATISTICAL_RESULTS_CSV};
use crate::plot::{render_boxplots, render_channel_differences, BOXPLOTS_PNG, CHANNEL_DIFFERENCES_PNG};
use crate::preprocess::preprocess;
use crate::recording::{load_recording, Recording};
use crate::report::{write_html, RunSummary, REPORT_HTML};
use crate::stats::{compare, Comparison};
use crate::table::{build_table, EntropyTable};

/// Everything the analysis produced.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub summary:    RunSummary,
    pub table:      EntropyTable,
    pub comparison: Comparison,
    pub ch_names:   Vec<String>,
}

/// Events of the configured stimulus types on the recording's trigger trace.
pub fn detect_events(rec: &Recording, cfg: &AnalysisConfig) -> Vec<Event> {
    let stim = rec.stim.to_vec();
    let events = find_events(&stim, &cfg.stimuli);
    info!(n_events = events.len(), "events detected");
    events
}

/// Entropy table and comparison for already cut epochs.
pub fn analyze_epochs(epochs: &Epochs, cfg: &AnalysisConfig) -> Result<(EntropyTable, Comparison)> {
    let table = build_table(epochs, cfg)?;
    let comparison = compare(&table, cfg)?;
    Ok((table, comparison))
}

/// Run every stage after acquisition on the recording at `path`.
pub fn analyze_file(path: &Path, cfg: &AnalysisConfig) -> Result<Analysis> {
    let raw = load_recording(path, cfg)?;
    let rec = preprocess(&raw, cfg)?;
    let events = detect_events(&rec, cfg);
    let epochs = epoch_events(&rec, &events, cfg)?;
    let (table, comparison) = analyze_epochs(&epochs, cfg)?;

    let summary = RunSummary {
        source:           path.display().to_string(),
        n_channels:       rec.n_channels(),
        sfreq:            rec.sfreq,
        duration_secs:    rec.duration_secs(),
        n_events:         events.len(),
        n_epochs:         epochs.n_epochs(),
        n_records:        table.records.len(),
        skipped_segments: table.skipped_segments,
        figures:          cfg.render_plots,
    };
    Ok(Analysis { summary, table, comparison, ch_names: rec.ch_names })
}

/// Write the CSV tables, figures and HTML report into `cfg.output_dir`.
///
/// Returns the names of the files written.
pub fn write_outputs(analysis: &Analysis, cfg: &AnalysisConfig) -> Result<Vec<&'static str>> {
    let dir = &cfg.output_dir;
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut written = Vec::new();

    write_entropy_values(&dir.join(ENTROPY_VALUES_CSV), &analysis.table)?;
    written.push(ENTROPY_VALUES_CSV);
    write_statistical_results(&dir.join(STATISTICAL_RESULTS_CSV), &analysis.comparison.results)?;
    written.push(STATISTICAL_RESULTS_CSV);

    let mut summary = analysis.summary.clone();
    summary.figures = cfg.render_plots && !analysis.table.is_empty();
    if summary.figures {
        render_boxplots(&dir.join(BOXPLOTS_PNG), &analysis.table)?;
        written.push(BOXPLOTS_PNG);
        render_channel_differences(&dir.join(CHANNEL_DIFFERENCES_PNG), &analysis.table, &analysis.ch_names)?;
        written.push(CHANNEL_DIFFERENCES_PNG);
    }

    write_html(&dir.join(REPORT_HTML), &summary, &analysis.comparison)?;
    written.push(REPORT_HTML);

    info!(dir = %dir.display(), files = written.len(), "outputs written");
    Ok(written)
}
