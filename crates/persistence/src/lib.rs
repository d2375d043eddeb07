#![deny(warnings)]

//! Report store: one pretty-printed JSON file per quarter, named
//! `<quarter>_report.json`, in a single directory.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sim_core::QuarterId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const REPORT_SUFFIX: &str = "_report.json";

/// Directory reports are written to when none is given.
pub fn default_reports_dir() -> &'static str {
    "reports"
}

#[derive(Clone, Debug)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating report directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, quarter: &QuarterId) -> PathBuf {
        self.dir.join(format!("{quarter}{REPORT_SUFFIX}"))
    }

    /// Write `report` for `quarter`, replacing any earlier file.
    pub fn save<T: Serialize>(&self, quarter: &QuarterId, report: &T) -> Result<PathBuf> {
        let path = self.path_for(quarter);
        let json = serde_json::to_string_pretty(report)
            .with_context(|| format!("serializing report for {quarter}"))?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        debug!(%quarter, path = %path.display(), "report saved");
        Ok(path)
    }

    /// Read the report for `quarter`; `None` if it was never saved.
    pub fn load<T: DeserializeOwned>(&self, quarter: &QuarterId) -> Result<Option<T>> {
        let path = self.path_for(quarter);
        if !path.exists() {
            return Ok(None);
        }
        let text =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let report = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(report))
    }

    /// Quarters with a saved report, in file-name order.
    pub fn quarters(&self) -> Result<Vec<QuarterId>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("listing {}", self.dir.display()))?;
        let mut quarters = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(quarter) = name.to_str().and_then(|n| n.strip_suffix(REPORT_SUFFIX)) {
                quarters.push(QuarterId::from(quarter));
            }
        }
        quarters.sort();
        Ok(quarters)
    }

    /// Every saved report, in file-name order.
    pub fn load_all<T: DeserializeOwned>(&self) -> Result<Vec<(QuarterId, T)>> {
        let mut reports = Vec::new();
        for quarter in self.quarters()? {
            if let Some(report) = self.load(&quarter)? {
                reports.push((quarter, report));
            }
        }
        Ok(reports)
    }
}
