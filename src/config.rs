//! Run configuration: loading, defaults and validation.
//!
//! Configuration files are JSON, or YAML when the file name ends in `.yaml` /
//! `.yml`. Every key is optional; missing keys keep their default, so a file
//! containing only `{"output_format": "json"}` is valid.
//!
//! ```json
//! {
//!   "target_urls": [
//!     "https://feeds.bbci.co.uk/news/rss.xml",
//!     { "url": "https://www.bbc.com/news", "kind": "html" }
//!   ],
//!   "timeout": 10,
//!   "max_retries": 3,
//!   "output_format": "both",
//!   "selectors": { "html": ["h2", ".headline"] }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ConfigError;
use crate::extract::ExtractOptions;
use crate::fetch::FetchPolicy;
use crate::models::{OutputMode, Target, TargetKind};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// A configured target: either a bare URL (kind inferred) or an explicit pair.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TargetEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        kind: Option<TargetKind>,
    },
}

impl TargetEntry {
    pub fn to_target(&self) -> Result<Target, ConfigError> {
        match self {
            TargetEntry::Url(url) => Target::inferred(url),
            TargetEntry::Detailed { url, kind: Some(kind) } => Target::new(url, *kind),
            TargetEntry::Detailed { url, kind: None } => Target::inferred(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Selectors {
    /// CSS selectors applied, in order, to HTML targets.
    pub html: Vec<String>,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            html: ["h1", "h2", "h3", ".headline", ".title"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub target_urls: Vec<TargetEntry>,
    /// Per-request timeout in seconds.
    pub timeout: f64,
    pub max_retries: u32,
    /// Initial delay between retries in seconds; doubles per retry.
    pub retry_delay: f64,
    /// Pause between consecutive targets in seconds.
    pub request_delay: f64,
    pub output_format: OutputMode,
    pub output_dir: PathBuf,
    pub user_agent: String,
    pub selectors: Selectors,
    pub min_headline_chars: usize,
    /// Drop repeated titles within one target's extraction (first one wins).
    pub deduplicate: bool,
    /// Treat an extraction that yields nothing as a failure.
    pub require_match: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_urls: vec![
                TargetEntry::Url("https://feeds.bbci.co.uk/news/rss.xml".to_string()),
                TargetEntry::Url("https://rss.cnn.com/rss/edition.rss".to_string()),
            ],
            timeout: 10.0,
            max_retries: 3,
            retry_delay: 2.0,
            request_delay: 1.0,
            output_format: OutputMode::Both,
            output_dir: PathBuf::from("."),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            selectors: Selectors::default(),
            min_headline_chars: 0,
            deduplicate: true,
            require_match: false,
        }
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| ConfigError::Invalid(format!("{field} must be a non-negative number of seconds: {e}")))
}

impl Config {
    /// Parse configuration text; `yaml` selects the YAML parser.
    pub fn parse(text: &str, yaml: bool) -> Result<Self, ConfigError> {
        if yaml {
            Ok(serde_yaml::from_str(text)?)
        } else {
            Ok(serde_json::from_str(text)?)
        }
    }

    /// Check ranges and resolve every target and selector.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_urls.is_empty() {
            return Err(ConfigError::Invalid("no target URLs configured".to_string()));
        }
        if seconds("timeout", self.timeout)?.is_zero() {
            return Err(ConfigError::Invalid("timeout must be greater than zero".to_string()));
        }
        seconds("retry_delay", self.retry_delay)?;
        seconds("request_delay", self.request_delay)?;
        self.targets()?;
        self.extract_options()?;
        Ok(())
    }

    /// Resolve every configured entry into a validated [`Target`].
    pub fn targets(&self) -> Result<Vec<Target>, ConfigError> {
        self.target_urls.iter().map(TargetEntry::to_target).collect()
    }

    pub fn fetch_policy(&self) -> Result<FetchPolicy, ConfigError> {
        Ok(FetchPolicy {
            timeout: seconds("timeout", self.timeout)?,
            max_retries: self.max_retries,
            retry_delay: seconds("retry_delay", self.retry_delay)?,
            user_agent: self.user_agent.clone(),
        })
    }

    pub fn extract_options(&self) -> Result<ExtractOptions, ConfigError> {
        ExtractOptions::new(
            &self.selectors.html,
            self.min_headline_chars,
            self.deduplicate,
            self.require_match,
        )
    }

    /// The pause slept between consecutive targets.
    pub fn request_delay(&self) -> Result<Duration, ConfigError> {
        seconds("request_delay", self.request_delay)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Load a configuration file, overlaying it on the defaults.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = Config::parse(&text, is_yaml(path))?;
    info!(targets = config.target_urls.len(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        let targets = config.targets().unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| t.kind() == TargetKind::Rss));
    }

    #[test]
    fn test_defaults_deduplicate_html_matches() {
        let config = Config::default();
        assert!(config.deduplicate);
        let options = config.extract_options().unwrap();
        assert!(options.deduplicate);
        assert_eq!(options.selectors.len(), 5);

        let opted_out = Config::parse(r#"{"deduplicate": false}"#, false).unwrap();
        assert!(!opted_out.extract_options().unwrap().deduplicate);
    }

    #[test]
    fn test_partial_json_overlays_defaults() {
        let config = Config::parse(r#"{"output_format": "json", "max_retries": 5}"#, false).unwrap();
        assert_eq!(config.output_format, OutputMode::Json);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.timeout, 10.0);
        assert_eq!(config.target_urls.len(), 2);
    }

    #[test]
    fn test_mixed_target_entries() {
        let json = r#"{"target_urls": [
            "https://example.com/feed.xml",
            {"url": "https://example.com/news", "kind": "html"},
            {"url": "https://example.com/rss"}
        ]}"#;
        let targets = Config::parse(json, false).unwrap().targets().unwrap();
        let kinds: Vec<_> = targets.iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, vec![TargetKind::Rss, TargetKind::Html, TargetKind::Rss]);
    }

    #[test]
    fn test_yaml_config() {
        let yaml = "target_urls:\n  - url: https://example.com/\n    kind: html\ntimeout: 2.5\nselectors:\n  html: [\"h2 a\"]\n";
        let config = Config::parse(yaml, true).unwrap();
        config.validate().unwrap();
        assert_eq!(config.fetch_policy().unwrap().timeout, Duration::from_millis(2500));
        assert_eq!(config.selectors.html, vec!["h2 a".to_string()]);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.timeout = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.target_urls.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.target_urls = vec![TargetEntry::Url("example.com/news".to_string())];
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        let mut config = Config::default();
        config.selectors.html = vec!["h2[".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::Selector { .. })));

        let mut config = Config::default();
        config.retry_delay = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("config.json");
        std::fs::write(&json_path, r#"{"request_delay": 0}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().request_delay, 0.0);

        let yaml_path = dir.path().join("config.yml");
        let mut f = std::fs::File::create(&yaml_path).unwrap();
        writeln!(f, "output_format: txt").unwrap();
        assert_eq!(load_config(&yaml_path).unwrap().output_format, OutputMode::Txt);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
