//! PNG figures rendered with `plotters`.
//!
//! - `boxplots.png`: one panel per entropy kind, rest and task boxes
//!   (quartiles, median, 1.5·IQR whiskers).
//! - `channel_differences.png`: one panel per entropy kind, a bar per channel
//!   with `mean(task) − mean(rest)`.
//!
//! The summaries drawn are computed by [`box_stats`] and
//! [`channel_differences`], which do not touch the drawing backend.
use std::path::Path;
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::entropy::EntropyKind;
use crate::table::{Condition, EntropyTable};

pub const BOXPLOTS_PNG: &str = "boxplots.png";
pub const CHANNEL_DIFFERENCES_PNG: &str = "channel_differences.png";

const REST_COLOR: RGBColor = RGBColor(70, 130, 180);
const TASK_COLOR: RGBColor = RGBColor(220, 110, 60);

/// Five-number summary of a box plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub q1:         f64,
    pub median:     f64,
    pub q3:         f64,
    /// Smallest value at or above `q1 − 1.5·IQR`.
    pub whisker_lo: f64,
    /// Largest value at or below `q3 + 1.5·IQR`.
    pub whisker_hi: f64,
}

/// Linear-interpolated quantile of sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Box-plot summary of `values`; `None` when empty.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let whisker_lo = sorted.iter().copied().find(|&v| v >= lo_fence).unwrap_or(q1);
    let whisker_hi = sorted.iter().rev().copied().find(|&v| v <= hi_fence).unwrap_or(q3);
    Some(BoxStats { q1, median, q3, whisker_lo, whisker_hi })
}

/// `mean(task) − mean(rest)` for channels `0..n_channels`; `None` for a
/// channel missing values on either side.
pub fn channel_differences(table: &EntropyTable, kind: EntropyKind, n_channels: usize) -> Vec<Option<f64>> {
    let mut sums = vec![[(0.0_f64, 0_usize); 2]; n_channels];
    for r in table.records.iter().filter(|r| r.kind == kind && r.channel < n_channels) {
        let side = match r.condition {
            Condition::Rest => 0,
            Condition::Task => 1,
        };
        sums[r.channel][side].0 += r.value;
        sums[r.channel][side].1 += 1;
    }
    sums.into_iter()
        .map(|[(rs, rn), (ts, tn)]| (rn > 0 && tn > 0).then(|| ts / tn as f64 - rs / rn as f64))
        .collect()
}

/// Grid of `(rows, cols)` holding `n` panels, two per row.
fn panel_grid(n: usize) -> (usize, usize) {
    let cols = n.clamp(1, 2);
    (n.div_ceil(cols).max(1), cols)
}

/// Padded `[lo, hi]` range enclosing `values`.
fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = if hi > lo { 0.1 * (hi - lo) } else { 0.5 * lo.abs().max(1e-3) };
    (lo - pad, hi + pad)
}

/// Slot of a condition on the box-plot x axis, fixed so a missing rest box
/// leaves the task box under its own label.
fn box_x(condition: Condition) -> f64 {
    match condition {
        Condition::Rest => 0.0,
        Condition::Task => 1.0,
    }
}

fn draw_box_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    kind: EntropyKind,
    boxes: &[(Condition, BoxStats)],
) -> Result<()> {
    let (y_lo, y_hi) = padded_range(boxes.iter().flat_map(|(_, b)| [b.whisker_lo, b.whisker_hi]));
    let mut chart = ChartBuilder::on(area)
        .caption(format!("{kind} entropy"), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5_f64..1.5_f64, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(2)
        .x_label_formatter(&|x| {
            Condition::ALL
                .into_iter()
                .find(|&c| box_x(c) == x.round())
                .map(|c| c.name().to_string())
                .unwrap_or_default()
        })
        .y_desc("value")
        .draw()?;

    let half = 0.25;
    for (condition, b) in boxes {
        let x = box_x(*condition);
        let color = match condition {
            Condition::Rest => REST_COLOR,
            Condition::Task => TASK_COLOR,
        };
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, b.q1), (x + half, b.q3)],
            color.mix(0.5).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, b.q1), (x + half, b.q3)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - half, b.median), (x + half, b.median)],
            BLACK.stroke_width(2),
        )))?;
        for (from, to) in [(b.q1, b.whisker_lo), (b.q3, b.whisker_hi)] {
            chart.draw_series(std::iter::once(PathElement::new(vec![(x, from), (x, to)], BLACK)))?;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x - half / 2.0, to), (x + half / 2.0, to)],
                BLACK,
            )))?;
        }
    }
    Ok(())
}

/// Render `boxplots.png` for every kind present in `table`.
pub fn render_boxplots(path: &Path, table: &EntropyTable) -> Result<()> {
    let kinds = table.kinds();
    let root = BitMapBackend::new(path, (1200, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly(panel_grid(kinds.len()));

    for (area, &kind) in panels.iter().zip(&kinds) {
        let boxes: Vec<(Condition, BoxStats)> = Condition::ALL
            .into_iter()
            .filter_map(|c| box_stats(&table.values(kind, c)).map(|b| (c, b)))
            .collect();
        draw_box_panel(area, kind, &boxes).with_context(|| format!("draw {kind} box plot"))?;
    }

    root.present().with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Render `channel_differences.png`; bars are labelled with `ch_names`.
pub fn render_channel_differences(path: &Path, table: &EntropyTable, ch_names: &[String]) -> Result<()> {
    let kinds = table.kinds();
    let n_ch = ch_names.len();
    let root = BitMapBackend::new(path, (1600, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly(panel_grid(kinds.len()));

    for (area, &kind) in panels.iter().zip(&kinds) {
        let diffs = channel_differences(table, kind, n_ch);
        let (y_lo, y_hi) = padded_range(diffs.iter().flatten().copied().chain([0.0]));
        let mut chart = ChartBuilder::on(area)
            .caption(format!("{kind}: task − rest per channel"), ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5_f64..(n_ch as f64 - 0.5).max(0.5), y_lo..y_hi)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n_ch.min(12))
            .x_label_formatter(&|x| {
                let i = x.round();
                if i >= 0.0 && (i as usize) < n_ch { ch_names[i as usize].clone() } else { String::new() }
            })
            .y_desc("mean(task) − mean(rest)")
            .draw()?;

        chart.draw_series(std::iter::once(PathElement::new(
            vec![(-0.5, 0.0), (n_ch as f64 - 0.5, 0.0)],
            BLACK.mix(0.4),
        )))?;
        chart.draw_series(diffs.iter().enumerate().filter_map(|(i, d)| {
            d.map(|d| {
                let x = i as f64;
                let color = if d < 0.0 { REST_COLOR } else { TASK_COLOR };
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, d)], color.filled())
            })
        }))?;
    }

    root.present().with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
