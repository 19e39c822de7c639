use indicatif::{ProgressBar, ProgressStyle};

use crate::measure::Measurement;
use crate::ops::Family;
use crate::report::Reporter;
use crate::BenchError;

/// Forwards to `inner` and advances `bar` by one per measurement.
///
/// The bar shows the family being measured. It is cleared by `finish`, or on drop
/// when a run ends early, so it never stays behind on stderr.
pub struct ProgressReporter<'a> {
    inner: Box<dyn Reporter + 'a>,
    bar: ProgressBar,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(bar: ProgressBar, inner: Box<dyn Reporter + 'a>) -> Self {
        let style = ProgressStyle::default_bar()
            .template("measuring {bar:40.cyan/blue} {pos:>2}/{len:<2} [{elapsed_precise}] {msg}")
            .unwrap_or(ProgressStyle::default_bar());
        bar.set_style(style);
        ProgressReporter { inner, bar }
    }
}

impl Reporter for ProgressReporter<'_> {
    fn family(&mut self, family: Family) -> Result<(), BenchError> {
        self.bar.set_message(family.to_string());
        self.inner.family(family)
    }

    fn report(&mut self, m: &Measurement) -> Result<(), BenchError> {
        self.bar.inc(1);
        // keep report lines on stdout from interleaving with the bar
        self.bar.suspend(|| self.inner.report(m))
    }

    fn finish(&mut self) -> Result<(), BenchError> {
        self.bar.finish_and_clear();
        self.inner.finish()
    }
}

impl Drop for ProgressReporter<'_> {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{run, Mode};
    use crate::testing::{CollectingReporter, RecordingPlatform, TickClock};
    use indicatif::ProgressDrawTarget;

    fn hidden_bar(mode: Mode) -> ProgressBar {
        ProgressBar::with_draw_target(
            Some(mode.operation_count() as u64),
            ProgressDrawTarget::hidden(),
        )
    }

    #[test]
    fn test_bar_follows_measurements() -> anyhow::Result<()> {
        let clock = TickClock::default();
        let platform = RecordingPlatform::new(clock.ticks(), 1);
        let mut out = CollectingReporter::default();
        let bar = hidden_bar(Mode(4));
        {
            let mut reporter = ProgressReporter::new(bar.clone(), Box::new(&mut out));
            run(Mode(4), &platform, &clock, &mut reporter)?;
        }
        assert_eq!(bar.position(), 3);
        assert_eq!(bar.message(), "pio");
        assert!(bar.is_finished());
        assert_eq!(out.measurements.len(), 3);
        assert!(out.finished);
        Ok(())
    }

    #[test]
    fn test_bar_cleared_when_mode_selects_nothing() -> anyhow::Result<()> {
        let clock = TickClock::default();
        let platform = RecordingPlatform::new(clock.ticks(), 1);
        let bar = hidden_bar(Mode(7));
        let mut reporter =
            ProgressReporter::new(bar.clone(), Box::new(CollectingReporter::default()));
        run(Mode(7), &platform, &clock, &mut reporter)?;
        assert!(bar.is_finished());
        assert_eq!(bar.position(), 0);
        Ok(())
    }

    #[test]
    fn test_bar_cleared_when_run_ends_early() {
        let bar = hidden_bar(Mode(0));
        let reporter = ProgressReporter::new(bar.clone(), Box::new(CollectingReporter::default()));
        assert!(!bar.is_finished());
        drop(reporter);
        assert!(bar.is_finished());
    }
}
