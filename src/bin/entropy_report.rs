use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use eeg_entropy::acquire::{locate_local, locate_sample_data};
use eeg_entropy::pipeline::{analyze_file, write_outputs};
use eeg_entropy::stats::{PairingPolicy, UnpairedTest};
use eeg_entropy::{report, AnalysisConfig};

#[derive(Parser)]
#[command(name = "entropy_report", about = "Rest vs task entropy analysis of the MNE sample EEG recording")]
struct Args {
    /// sample_audvis_raw.fif; searched for in the MNE data folders if omitted
    #[arg(long)]
    fif: Option<PathBuf>,

    /// Directory receiving the CSV tables, figures and report
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Use Welch's test instead of Student's when the conditions are unpaired
    #[arg(long)]
    welch: bool,

    /// Pair rest and task only when they cover the same (epoch, channel) segments
    #[arg(long)]
    matched_pairs: bool,

    /// Skip rendering boxplots.png and channel_differences.png
    #[arg(long)]
    no_plots: bool,

    /// Fail instead of downloading the sample dataset when no local copy exists
    #[arg(long)]
    no_download: bool,

    /// Connect and read timeout of the dataset download, in seconds
    #[arg(long, default_value_t = 120)]
    download_timeout: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eeg_entropy=info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let located = if args.no_download {
        locate_local(args.fif.as_deref())
    } else {
        locate_sample_data(args.fif.as_deref(), Duration::from_secs(args.download_timeout))
    };
    let path = match located {
        Ok(p) => p,
        Err(err) => {
            report::print_acquisition_failure(&err);
            std::process::exit(2);
        }
    };

    let cfg = AnalysisConfig {
        output_dir: args.output_dir,
        unpaired_test: if args.welch { UnpairedTest::Welch } else { UnpairedTest::Student },
        pairing: if args.matched_pairs { PairingPolicy::MatchedKeys } else { PairingPolicy::SampleCount },
        render_plots: !args.no_plots,
        ..AnalysisConfig::default()
    };

    let analysis = analyze_file(&path, &cfg)?;
    report::print_summary(&analysis.summary);
    report::print_table(&analysis.table);
    report::print_comparison(&analysis.comparison);

    let written = write_outputs(&analysis, &cfg)?;
    report::print_outputs(&cfg.output_dir, &written);
    Ok(())
}
