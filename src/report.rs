//! Human-facing output: console narration and the HTML report.
use std::fmt::{self, Write as _};
use std::path::Path;
use anyhow::{Context, Result};

use crate::acquire::AcquisitionError;
use crate::plot::{BOXPLOTS_PNG, CHANNEL_DIFFERENCES_PNG};
use crate::stats::Comparison;
use crate::table::EntropyTable;

pub const REPORT_HTML: &str = "report.html";

/// Summary of the run shown in the report header.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub source:           String,
    pub n_channels:       usize,
    pub sfreq:            f64,
    pub duration_secs:    f64,
    pub n_events:         usize,
    pub n_epochs:         usize,
    pub n_records:        usize,
    pub skipped_segments: usize,
    /// Whether the PNG figures were rendered next to the report.
    pub figures:          bool,
}

pub fn print_acquisition_failure(err: &AcquisitionError) {
    println!("Could not load the sample recording.");
    println!("{err}");
    for hint in err.hints() {
        println!("  - {hint}");
    }
}

pub fn print_summary(summary: &RunSummary) {
    println!("Recording: {}", summary.source);
    println!(
        "  {} EEG channels at {:.2} Hz ({:.1} s)",
        summary.n_channels, summary.sfreq, summary.duration_secs
    );
    println!("  {} events, {} epochs", summary.n_events, summary.n_epochs);
}

pub fn print_table(table: &EntropyTable) {
    println!(
        "Computed {} entropy values ({} near-constant windows skipped)",
        table.records.len(),
        table.skipped_segments
    );
}

/// Print one block per compared kind, then the skipped kinds.
pub fn print_comparison(cmp: &Comparison) {
    println!();
    println!("Rest vs task");
    println!("============");
    for r in &cmp.results {
        println!("{} entropy ({}):", r.kind, r.test.name());
        println!("  rest: {:.4} ± {:.4} (n = {})", r.rest_mean, r.rest_std, r.n_rest);
        println!("  task: {:.4} ± {:.4} (n = {})", r.task_mean, r.task_std, r.n_task);
        println!("  t = {:.3}, p = {:.4e} {}", r.t_stat, r.p_value, r.tier);
        println!("  Cohen's d = {:.3}", r.effect_size);
    }
    for skip in &cmp.skips {
        println!("skipped {skip}");
    }
}

pub fn print_outputs(dir: &Path, files: &[&str]) {
    println!();
    println!("Results written to {}:", dir.display());
    for f in files {
        println!("  {f}");
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Standalone HTML page with the summary, the results table, the skipped
/// kinds and the figures.
pub fn render_html(summary: &RunSummary, cmp: &Comparison) -> Result<String> {
    let mut h = String::new();
    write_page(&mut h, summary, cmp).context("render HTML report")?;
    Ok(h)
}

fn write_page(h: &mut String, summary: &RunSummary, cmp: &Comparison) -> fmt::Result {
    writeln!(h, "<!DOCTYPE html>")?;
    writeln!(h, "<html><head><meta charset=\"utf-8\"><title>EEG entropy: rest vs task</title>")?;
    writeln!(
        h,
        "<style>body{{font-family:sans-serif;margin:2em}}table{{border-collapse:collapse}}\
         td,th{{border:1px solid #999;padding:4px 8px;text-align:right}}th{{background:#eee}}\
         .sig{{font-weight:bold}}</style>"
    )?;
    writeln!(h, "</head><body>")?;
    writeln!(h, "<h1>EEG entropy: rest vs task</h1>")?;

    writeln!(h, "<h2>Data</h2><ul>")?;
    writeln!(h, "<li>Source: {}</li>", escape(&summary.source))?;
    writeln!(
        h,
        "<li>{} EEG channels, {:.2} Hz, {:.1} s</li>",
        summary.n_channels, summary.sfreq, summary.duration_secs
    )?;
    writeln!(h, "<li>{} events, {} epochs</li>", summary.n_events, summary.n_epochs)?;
    writeln!(
        h,
        "<li>{} entropy values, {} near-constant windows skipped</li>",
        summary.n_records, summary.skipped_segments
    )?;
    writeln!(h, "</ul>")?;

    writeln!(h, "<h2>Statistics</h2>")?;
    if cmp.results.is_empty() {
        writeln!(h, "<p>No entropy kind had enough data for a comparison.</p>")?;
    } else {
        writeln!(
            h,
            "<table><tr><th>entropy</th><th>test</th><th>rest mean ± std</th><th>task mean ± std</th>\
             <th>t</th><th>p</th><th></th><th>Cohen's d</th></tr>"
        )?;
        for r in &cmp.results {
            let class = if r.significant { " class=\"sig\"" } else { "" };
            writeln!(
                h,
                "<tr{class}><td>{}</td><td>{}</td><td>{:.4} ± {:.4}</td><td>{:.4} ± {:.4}</td>\
                 <td>{:.3}</td><td>{:.3e}</td><td>{}</td><td>{:.3}</td></tr>",
                r.kind, r.test.name(), r.rest_mean, r.rest_std, r.task_mean, r.task_std,
                r.t_stat, r.p_value, r.tier, r.effect_size
            )?;
        }
        writeln!(h, "</table>")?;
        writeln!(h, "<p>*** p &lt; 0.001, ** p &lt; 0.01, * p &lt; 0.05, ns not significant</p>")?;
    }
    if !cmp.skips.is_empty() {
        writeln!(h, "<h3>Skipped</h3><ul>")?;
        for skip in &cmp.skips {
            writeln!(h, "<li>{}</li>", escape(&skip.to_string()))?;
        }
        writeln!(h, "</ul>")?;
    }

    if summary.figures {
        writeln!(h, "<h2>Figures</h2>")?;
        writeln!(h, "<img src=\"{BOXPLOTS_PNG}\" alt=\"entropy distributions\">")?;
        writeln!(h, "<img src=\"{CHANNEL_DIFFERENCES_PNG}\" alt=\"channel differences\">")?;
    }
    writeln!(h, "</body></html>")
}

pub fn write_html(path: &Path, summary: &RunSummary, cmp: &Comparison) -> Result<()> {
    let html = render_html(summary, cmp)?;
    std::fs::write(path, html).with_context(|| format!("write {}", path.display()))
}
