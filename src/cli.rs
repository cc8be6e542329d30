//! Command-line interface definitions for Headline Scraper.
//!
//! Every flag overrides the matching configuration key; anything not given on
//! the command line comes from `--config` or the built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, TargetEntry};
use crate::models::{OutputMode, TargetKind};

/// Command-line arguments for Headline Scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape the default feeds, writing both formats to the current directory
/// headline_scraper
///
/// # Use a config file and only write JSON
/// headline_scraper -c scraper.json -o json
///
/// # Scrape one HTML page
/// headline_scraper -u https://www.bbc.com/news -k html -d ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a JSON or YAML configuration file
    #[arg(short, long, env = "HEADLINES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Single URL to scrape (replaces the configured targets)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Kind of document behind --url; inferred from the URL when omitted
    #[arg(short, long, value_enum, requires = "url")]
    pub kind: Option<TargetKind>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputMode>,

    /// Directory the output files are written to
    #[arg(short = 'd', long, env = "HEADLINES_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Retries per target after the first failed attempt
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Also append log output to this file
    #[arg(long, env = "HEADLINES_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Overlay command-line values onto a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.target_urls = vec![TargetEntry::Detailed {
                url: url.clone(),
                kind: self.kind,
            }];
        }
        if let Some(output) = self.output {
            config.output_format = output;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "headline_scraper",
            "--config",
            "./scraper.json",
            "--url",
            "https://www.bbc.com/news",
            "--output",
            "json",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("./scraper.json")));
        assert_eq!(cli.url.as_deref(), Some("https://www.bbc.com/news"));
        assert_eq!(cli.output, Some(OutputMode::Json));
        assert_eq!(cli.log_file, None);
    }

    #[test]
    fn test_log_file_flag() {
        let cli = Cli::parse_from(["headline_scraper", "--log-file", "logs/scraper.log"]);
        assert_eq!(cli.log_file, Some(PathBuf::from("logs/scraper.log")));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "headline_scraper",
            "-u",
            "https://example.com/",
            "-k",
            "html",
            "-o",
            "txt",
            "-d",
            "/tmp/out",
        ]);

        assert_eq!(cli.kind, Some(TargetKind::Html));
        assert_eq!(cli.output, Some(OutputMode::Txt));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_text_is_accepted_for_txt() {
        let cli = Cli::parse_from(["headline_scraper", "--output", "text"]);
        assert_eq!(cli.output, Some(OutputMode::Txt));
    }

    #[test]
    fn test_kind_requires_url() {
        assert!(Cli::try_parse_from(["headline_scraper", "--kind", "rss"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::parse_from([
            "headline_scraper",
            "-u",
            "https://www.bbc.com/news",
            "-o",
            "both",
            "--max-retries",
            "0",
            "--timeout",
            "3",
        ]);
        let mut config = Config::default();
        config.output_format = OutputMode::Json;
        cli.apply(&mut config);

        let targets = config.targets().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].kind(), TargetKind::Html);
        assert_eq!(config.output_format, OutputMode::Both);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.timeout, 3.0);
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let cli = Cli::parse_from(["headline_scraper"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
    }
}
