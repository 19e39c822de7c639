use std::{io::stdout, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use indicatif::ProgressBar;
use log::info;
use vmexit_bench::{
    config::{FileConfig, OutputFormat, RunConfig},
    ops::native::run_native,
    report::{make_reporter, write_run_file, RunReport},
    timer::construct_clock,
    util::{init_logging_with_progress, ProgressReporter},
};

/// CLI arguments for the `bench` binary.
///
/// Every selected operation is executed 10,000 times as warmup and 10,000,000
/// times measured. Report lines go to stdout, logs to stderr.
#[derive(Debug, Parser)]
struct CliArgs {
    /// The run mode: 0 = all families, 1 = cpuid, 2 = msr, 3 = hypercall, 4 = pio.
    /// Any other value runs nothing. Modes 0 and 2 read MSRs and need CPL 0, so they
    /// fail before measuring anything when run from user space. Modes 0 and 4 need
    /// root for port access, modes 0 and 3 need a hypervisor.
    #[arg(long, allow_negative_numbers = true)]
    mode: Option<i32>,
    /// The format of the report lines.
    #[arg(long)]
    format: Option<OutputFormat>,
    /// A JSON file with `mode`, `format` and `results_dir`. Command line flags take precedence.
    #[arg(long)]
    config: Option<String>,
    /// Write all measurements of the run to `<dir>/results_<timestamp>.json`.
    #[arg(long)]
    results_dir: Option<PathBuf>,
}

unsafe fn _main() -> anyhow::Result<()> {
    let progress = init_logging_with_progress()?;

    let args = CliArgs::parse();
    let file = args
        .config
        .as_deref()
        .map(FileConfig::from_jsonfile)
        .transpose()
        .context("failed to load config file")?;
    let config = RunConfig::resolve(file, args.mode, args.format, args.results_dir);
    info!("Initializing: mode={}", config.mode);

    let clock = construct_clock()?;
    let bar = progress.add(ProgressBar::new(config.mode.operation_count() as u64));
    let mut reporter = ProgressReporter::new(bar, make_reporter(config.format, stdout().lock()));

    let run = run_native(config.mode, clock.as_ref(), &mut reporter)
        .with_context(|| format!("mode {} failed", config.mode))?;
    drop(reporter);

    if let Some(dir) = &config.results_dir {
        if !run.measurements.is_empty() {
            let report = RunReport::new(config.mode, run.vendor, run.hypercall, &run.measurements);
            let path = write_run_file(dir, &report)?;
            info!("Wrote results to {}", path.display());
        }
    }
    info!("Exit");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    unsafe { _main() }
}
