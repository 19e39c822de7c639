use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::harness::Mode;

/// The format of the report lines written to stdout.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<operation>: <cycles> cycles (avg: <n>), <ns> ns (avg: <n>)`
    #[default]
    Text,
    /// One JSON object per measurement and line.
    Json,
    /// CSV with a header row.
    Csv,
}

/// Optional settings loaded from a JSON file, e.g. `{"mode": 2, "format": "csv"}`.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub mode: Option<Mode>,
    pub format: Option<OutputFormat>,
    pub results_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_jsonfile(filepath: &str) -> Result<FileConfig> {
        let mut file = File::open(Path::new(filepath))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config: FileConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

/// The settings of one run. Read once at start and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunConfig {
    pub mode: Mode,
    pub format: OutputFormat,
    pub results_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Command line values win over file values, file values over defaults.
    pub fn resolve(
        file: Option<FileConfig>,
        mode: Option<i32>,
        format: Option<OutputFormat>,
        results_dir: Option<PathBuf>,
    ) -> Self {
        let file = file.unwrap_or_default();
        RunConfig {
            mode: mode.map(Mode).or(file.mode).unwrap_or_default(),
            format: format.or(file.format).unwrap_or_default(),
            results_dir: results_dir.or(file.results_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::resolve(None, None, None, None);
        assert_eq!(config.mode, Mode(0));
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.results_dir, None);
    }

    #[test]
    fn test_cli_overrides_file() -> anyhow::Result<()> {
        let file: FileConfig =
            serde_json::from_str(r#"{"mode": 2, "format": "csv", "results_dir": "results"}"#)?;
        let config = RunConfig::resolve(Some(file), Some(-1), None, None);
        assert_eq!(config.mode, Mode(-1));
        assert_eq!(config.format, OutputFormat::Csv);
        assert_eq!(config.results_dir, Some(PathBuf::from("results")));
        Ok(())
    }

    #[test]
    fn test_file_mode_used_without_cli_mode() -> anyhow::Result<()> {
        let file: FileConfig = serde_json::from_str(r#"{"mode": 4}"#)?;
        let config = RunConfig::resolve(Some(file), None, Some(OutputFormat::Json), None);
        assert_eq!(config.mode, Mode(4));
        assert_eq!(config.format, OutputFormat::Json);
        Ok(())
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<FileConfig>(r#"{"iterations": 5}"#).is_err());
    }
}
