//! Flat-file output: the entropy table and the comparison results as CSV.
//!
//! Floats are written with `f64`'s `Display`, which is the shortest string
//! that parses back to the same value, so a reload is exact.
//!
//! ```text
//! entropy_values.csv       condition,channel,epoch,entropy_type,value
//! statistical_results.csv  entropy_type,rest_mean,rest_std,task_mean,task_std,
//!                          t_stat,p_value,significant,effect_size
//! ```
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use anyhow::{bail, Context, Result};

use crate::entropy::EntropyKind;
use crate::stats::ComparisonResult;
use crate::table::{EntropyRecord, EntropyTable};

pub const ENTROPY_VALUES_CSV: &str = "entropy_values.csv";
pub const STATISTICAL_RESULTS_CSV: &str = "statistical_results.csv";

const ENTROPY_HEADER: &str = "condition,channel,epoch,entropy_type,value";
const RESULTS_HEADER: &str =
    "entropy_type,rest_mean,rest_std,task_mean,task_std,t_stat,p_value,significant,effect_size";

/// One row of `statistical_results.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub kind:        EntropyKind,
    pub rest_mean:   f64,
    pub rest_std:    f64,
    pub task_mean:   f64,
    pub task_std:    f64,
    pub t_stat:      f64,
    pub p_value:     f64,
    pub significant: bool,
    pub effect_size: f64,
}

impl From<&ComparisonResult> for ResultRow {
    fn from(r: &ComparisonResult) -> Self {
        Self {
            kind:        r.kind,
            rest_mean:   r.rest_mean,
            rest_std:    r.rest_std,
            task_mean:   r.task_mean,
            task_std:    r.task_std,
            t_stat:      r.t_stat,
            p_value:     r.p_value,
            significant: r.significant,
            effect_size: r.effect_size,
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write one row per record, in table order.
pub fn write_entropy_values(path: &Path, table: &EntropyTable) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "{ENTROPY_HEADER}")?;
    for r in &table.records {
        writeln!(w, "{},{},{},{},{}", r.condition, r.channel, r.epoch, r.kind, r.value)?;
    }
    w.flush().with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn write_statistical_results(path: &Path, results: &[ComparisonResult]) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "{RESULTS_HEADER}")?;
    for r in results.iter().map(ResultRow::from) {
        writeln!(
            w,
            "{},{},{},{},{},{},{},{},{}",
            r.kind, r.rest_mean, r.rest_std, r.task_mean, r.task_std,
            r.t_stat, r.p_value, r.significant, r.effect_size
        )?;
    }
    w.flush().with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Data lines of a CSV file with the given header, split on commas.
fn read_rows(path: &Path, header: &str, n_fields: usize) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    match lines.next().transpose()? {
        Some(first) if first.trim_end() == header => {}
        _ => bail!("{} does not start with header {header:?}", path.display()),
    }

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<String> = line.trim_end().split(',').map(str::to_string).collect();
        if fields.len() != n_fields {
            bail!("{}:{}: expected {n_fields} fields, got {}", path.display(), i + 2, fields.len());
        }
        rows.push(fields);
    }
    Ok(rows)
}

/// Reload `entropy_values.csv`. The skipped-segment count is not stored and
/// reads back as zero.
pub fn read_entropy_values(path: &Path) -> Result<EntropyTable> {
    let records = read_rows(path, ENTROPY_HEADER, 5)?
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            let ctx = || format!("{} row {}", path.display(), i + 1);
            Ok(EntropyRecord {
                condition: f[0].parse().with_context(ctx)?,
                channel:   f[1].parse().with_context(ctx)?,
                epoch:     f[2].parse().with_context(ctx)?,
                kind:      f[3].parse().with_context(ctx)?,
                value:     f[4].parse().with_context(ctx)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(EntropyTable { records, skipped_segments: 0 })
}

pub fn read_statistical_results(path: &Path) -> Result<Vec<ResultRow>> {
    read_rows(path, RESULTS_HEADER, 9)?
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            let ctx = || format!("{} row {}", path.display(), i + 1);
            Ok(ResultRow {
                kind:        f[0].parse().with_context(ctx)?,
                rest_mean:   f[1].parse().with_context(ctx)?,
                rest_std:    f[2].parse().with_context(ctx)?,
                task_mean:   f[3].parse().with_context(ctx)?,
                task_std:    f[4].parse().with_context(ctx)?,
                t_stat:      f[5].parse().with_context(ctx)?,
                p_value:     f[6].parse().with_context(ctx)?,
                significant: f[7].parse().with_context(ctx)?,
                effect_size: f[8].parse().with_context(ctx)?,
            })
        })
        .collect()
}
