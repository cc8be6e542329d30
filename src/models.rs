//! Data models flowing through the scraping pipeline.
//!
//! - [`Target`]: one URL plus the declared kind of document behind it
//! - [`FetchResult`]: the raw payload returned for a Target
//! - [`Headline`]: one extracted, normalized title
//! - [`RunReport`]: every headline and per-Target outcome of a single run

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, TargetError};
use crate::utils::collapse_whitespace;

/// The kind of document a Target serves, which decides the extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// RSS 2.0, RSS 1.0 (RDF) or Atom feed.
    Rss,
    /// Any HTML page, scraped with CSS selectors.
    Html,
}

impl TargetKind {
    /// Guess the kind from the URL alone: anything mentioning `rss` or `xml`
    /// is treated as a feed.
    pub fn infer(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if lower.contains("rss") || lower.contains("xml") {
            TargetKind::Rss
        } else {
            TargetKind::Html
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Rss => f.write_str("rss"),
            TargetKind::Html => f.write_str("html"),
        }
    }
}

/// A URL to scrape and how to read it. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    kind: TargetKind,
}

impl Target {
    /// Build a Target, rejecting anything that is not an absolute http(s) URL.
    pub fn new(url: &str, kind: TargetKind) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url.trim()).map_err(|e| ConfigError::invalid_url(url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::invalid_url(url, "scheme must be http or https"));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::invalid_url(url, "missing host"));
        }
        Ok(Self { url: parsed, kind })
    }

    /// Build a Target whose kind is inferred from the URL.
    pub fn inferred(url: &str) -> Result<Self, ConfigError> {
        Self::new(url, TargetKind::infer(url))
    }

    /// The parsed, absolute URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// How the payload behind this Target is read.
    pub fn kind(&self) -> TargetKind {
        self.kind
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Raw content retrieved for one Target.
#[derive(Debug)]
pub struct FetchResult {
    pub target: Target,
    pub status: u16,
    pub content_type: Option<String>,
    pub payload: Vec<u8>,
    /// Total number of HTTP attempts made, including the successful one.
    pub attempts: u32,
}

/// A single headline as written to the outputs.
///
/// The title is always trimmed, whitespace-collapsed and non-empty; use
/// [`Headline::new`] to get that guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Headline {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Item summary from a feed (`description` or Atom `summary`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// URL of the Target this headline was extracted from.
    pub source: String,
    /// CSS selector that matched, for headlines scraped from HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl Headline {
    /// Normalize a candidate title; returns `None` when nothing but whitespace remains.
    pub fn new(raw_title: &str, source: impl Into<String>) -> Option<Self> {
        let title = collapse_whitespace(raw_title);
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title,
            link: None,
            description: None,
            published: None,
            source: source.into(),
            selector: None,
        })
    }

    /// Attach a link; blank values are dropped.
    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link.filter(|l| !l.trim().is_empty());
        self
    }

    /// Attach a summary, whitespace-collapsed; blank values are dropped.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description
            .map(|d| collapse_whitespace(&d))
            .filter(|d| !d.is_empty());
        self
    }

    /// Attach the raw publication date text; blank values are dropped.
    pub fn with_published(mut self, published: Option<String>) -> Self {
        self.published = published
            .map(|p| collapse_whitespace(&p))
            .filter(|p| !p.is_empty());
        self
    }

    /// Record which CSS selector produced this headline.
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

/// What happened to one Target during a run.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: Target,
    /// Number of headlines contributed, or the error that failed the Target.
    pub result: Result<usize, TargetError>,
}

impl TargetOutcome {
    /// True when the Target contributed a (possibly empty) headline list.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything one invocation produced, in Target order.
#[derive(Debug)]
pub struct RunReport {
    pub generated_at: DateTime<Local>,
    pub headlines: Vec<Headline>,
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    /// An empty report stamped with the run start time.
    pub fn new(generated_at: DateTime<Local>) -> Self {
        Self {
            generated_at,
            headlines: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    /// Number of Targets that succeeded.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of Targets that failed to fetch or extract.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when at least one Target was processed and none succeeded.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.succeeded() == 0
    }

    /// Distinct headline sources in first-seen order.
    pub fn sources(&self) -> Vec<String> {
        use itertools::Itertools;
        self.headlines
            .iter()
            .map(|h| h.source.clone())
            .unique()
            .collect()
    }
}

/// A single file format the sink can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// File extension used for this format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

/// The `output_format` setting: which files a run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[serde(alias = "text")]
    #[value(alias = "text")]
    Txt,
    Json,
    #[default]
    Both,
}

impl OutputMode {
    /// The concrete formats written for this setting, text first.
    pub fn formats(&self) -> Vec<OutputFormat> {
        match self {
            OutputMode::Txt => vec![OutputFormat::Text],
            OutputMode::Json => vec![OutputFormat::Json],
            OutputMode::Both => vec![OutputFormat::Text, OutputFormat::Json],
        }
    }
}
