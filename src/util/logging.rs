use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

/// Install `env_logger` (default filter `info`, override with `RUST_LOG`) behind a
/// progress bridge, so log lines are printed above any active progress bar.
pub fn init_logging_with_progress() -> anyhow::Result<MultiProgress> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let level = logger.filter();
    let progress = MultiProgress::new();
    LogWrapper::new(progress.clone(), logger).try_init()?;
    log::set_max_level(level);
    Ok(progress)
}
