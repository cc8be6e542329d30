//! JSON output with run metadata.
//!
//! # Output Structure
//!
//! ```json
//! {
//!   "metadata": {
//!     "generated_at": "2024-03-09T07:05:01.123456+01:00",
//!     "total_headlines": 2,
//!     "sources": ["https://feeds.bbci.co.uk/news/rss.xml"]
//!   },
//!   "headlines": [
//!     { "title": "…", "link": "https://…", "description": "…", "published": "…", "source": "https://…" },
//!     { "title": "…", "link": "https://…", "source": "https://…", "selector": "h2" }
//!   ]
//! }
//! ```
//!
//! `link`, `description`, `published` and `selector` are omitted when the
//! source did not provide them.
//! Non-ASCII text is written as-is, not `\u` escaped.

use serde::{Deserialize, Serialize};

use crate::models::{Headline, RunReport};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Metadata {
    /// RFC 3339 local timestamp of the run.
    pub generated_at: String,
    pub total_headlines: usize,
    /// Distinct headline sources in first-seen order.
    pub sources: Vec<String>,
}

/// The document written to `news_headlines_<stamp>.json`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HeadlineDocument {
    pub metadata: Metadata,
    pub headlines: Vec<Headline>,
}

impl HeadlineDocument {
    /// Snapshot a report; `generated_at` is formatted as RFC 3339.
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            metadata: Metadata {
                generated_at: report.generated_at.to_rfc3339(),
                total_headlines: report.headlines.len(),
                sources: report.sources(),
            },
            headlines: report.headlines.clone(),
        }
    }
}

/// Serialize a report as pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Returns the `serde_json` error if serialization fails.
pub fn render(report: &RunReport) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(&HeadlineDocument::from_report(report))?;
    json.push('\n');
    Ok(json)
}
