//! Result sink: writes a [`RunReport`] to one file per requested format.
//!
//! # Submodules
//!
//! - [`text`]: one headline per line
//! - [`json`]: headline objects plus run metadata
//!
//! The sink never picks file names itself; callers pass a naming function
//! (see [`crate::utils::timestamped_namer`]). Formats are written
//! independently: a failure for one format is recorded and the remaining
//! formats are still attempted.

pub mod json;
pub mod text;

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::WriteError;
use crate::models::{OutputFormat, RunReport};

/// Files written and formats that failed during one sink call.
#[derive(Debug, Default)]
pub struct WriteOutcome {
    pub written: Vec<PathBuf>,
    pub failed: Vec<WriteError>,
}

impl WriteOutcome {
    /// True when nothing at all could be written.
    pub fn all_failed(&self) -> bool {
        self.written.is_empty() && !self.failed.is_empty()
    }
}

fn render(report: &RunReport, format: OutputFormat, path: &Path) -> Result<Vec<u8>, WriteError> {
    match format {
        OutputFormat::Text => Ok(text::render(report).into_bytes()),
        OutputFormat::Json => json::render(report)
            .map(String::into_bytes)
            .map_err(|e| WriteError::serialize(path, &e)),
    }
}

async fn write_one(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| WriteError::io(parent, &e))?;
    }
    fs::write(path, bytes)
        .await
        .map_err(|e| WriteError::io(path, &e))
}

/// Write `report` once per format, naming each file with `name_for`.
#[instrument(level = "info", skip_all, fields(headlines = report.headlines.len(), formats = formats.len()))]
pub async fn write_report<F>(report: &RunReport, formats: &[OutputFormat], name_for: F) -> WriteOutcome
where
    F: Fn(OutputFormat) -> PathBuf,
{
    let mut outcome = WriteOutcome::default();
    for &format in formats {
        let path = name_for(format);
        let result = match render(report, format, &path) {
            Ok(bytes) => write_one(&path, &bytes).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                info!(path = %path.display(), ?format, "Wrote headlines");
                outcome.written.push(path);
            }
            Err(e) => {
                error!(path = %path.display(), ?format, error = %e, "Failed writing headlines");
                outcome.failed.push(e);
            }
        }
    }
    outcome
}
