//! Reporting of measurements.
//!
//! Every reporter keeps the five figures of a measurement: the operation and its
//! parameters, total and average cycles, total and average nanoseconds. JSON and CSV
//! additionally carry the raw bracket readings.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::OutputFormat;
use crate::harness::Mode;
use crate::measure::Measurement;
use crate::ops::{Family, HypercallKind, Vendor};
use crate::util::{BENCH_COUNT, WARMUP_COUNT};
use crate::BenchError;

/// Receives measurements as the harness produces them.
pub trait Reporter {
    /// Called before the first measurement of `family`.
    fn family(&mut self, _family: Family) -> Result<(), BenchError> {
        Ok(())
    }
    fn report(&mut self, m: &Measurement) -> Result<(), BenchError>;
    /// Called once after the last measurement of a run.
    fn finish(&mut self) -> Result<(), BenchError> {
        Ok(())
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn family(&mut self, family: Family) -> Result<(), BenchError> {
        (**self).family(family)
    }

    fn report(&mut self, m: &Measurement) -> Result<(), BenchError> {
        (**self).report(m)
    }

    fn finish(&mut self) -> Result<(), BenchError> {
        (**self).finish()
    }
}

/// A flat, serializable view of a [`Measurement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub family: Family,
    pub op: String,
    pub warmup: u64,
    pub iterations: u64,
    pub start_cycles: u64,
    pub end_cycles: u64,
    pub start_ns: i64,
    pub end_ns: i64,
    pub total_cycles: u64,
    pub avg_cycles: u64,
    pub total_ns: i64,
    pub avg_ns: i64,
}

impl From<&Measurement> for Record {
    fn from(m: &Measurement) -> Self {
        Record {
            family: m.op.family(),
            op: m.op.to_string(),
            warmup: m.warmup,
            iterations: m.iterations,
            start_cycles: m.start.cycles,
            end_cycles: m.end.cycles,
            start_ns: m.start.ns,
            end_ns: m.end.ns,
            total_cycles: m.total_cycles(),
            avg_cycles: m.avg_cycles(),
            total_ns: m.total_ns(),
            avg_ns: m.avg_ns(),
        }
    }
}

/// One human-readable line per measurement.
pub struct TextReporter<W: Write> {
    out: W,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, m: &Measurement) -> Result<(), BenchError> {
        writeln!(
            self.out,
            "{}: {} cycles (avg: {}), {} ns (avg: {})",
            m.op,
            m.total_cycles(),
            m.avg_cycles(),
            m.total_ns(),
            m.avg_ns()
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BenchError> {
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, m: &Measurement) -> Result<(), BenchError> {
        serde_json::to_writer(&mut self.out, &Record::from(m))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BenchError> {
        self.out.flush()?;
        Ok(())
    }
}

/// A header line followed by one row per measurement.
pub struct CsvReporter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
        }
    }
}

impl<W: Write> Reporter for CsvReporter<W> {
    fn report(&mut self, m: &Measurement) -> Result<(), BenchError> {
        self.writer.serialize(Record::from(m))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BenchError> {
        self.writer.flush()?;
        Ok(())
    }
}

pub fn make_reporter<'a, W: Write + 'a>(format: OutputFormat, out: W) -> Box<dyn Reporter + 'a> {
    match format {
        OutputFormat::Text => Box::new(TextReporter::new(out)),
        OutputFormat::Json => Box::new(JsonReporter::new(out)),
        OutputFormat::Csv => Box::new(CsvReporter::new(out)),
    }
}

/// Everything a run produced, written once after the harness returns.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub date: String,
    pub mode: Mode,
    pub vendor: Vendor,
    pub hypercall: HypercallKind,
    pub warmup: u64,
    pub iterations: u64,
    pub measurements: Vec<Record>,
}

impl RunReport {
    pub fn new(
        mode: Mode,
        vendor: Vendor,
        hypercall: HypercallKind,
        measurements: &[Measurement],
    ) -> Self {
        RunReport {
            date: chrono::Local::now().to_rfc3339(),
            mode,
            vendor,
            hypercall,
            warmup: WARMUP_COUNT,
            iterations: BENCH_COUNT,
            measurements: measurements.iter().map(Record::from).collect(),
        }
    }
}

/// Write `report` to `dir/results_<timestamp>.json` and return the path.
pub fn write_run_file(dir: &Path, report: &RunReport) -> Result<PathBuf, BenchError> {
    std::fs::create_dir_all(dir)?;
    let now = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let path = dir.join(format!("results_{}.json", now));
    let mut json_file = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut json_file, report)?;
    json_file.flush()?;
    Ok(path)
}
