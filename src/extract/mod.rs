//! Headline extraction from fetched payloads.
//!
//! The strategy is picked from the Target's declared [`TargetKind`]:
//!
//! | Kind | Module | Headline source |
//! |------|--------|-----------------|
//! | `rss` | [`rss`] | `<title>` of every `<item>` / `<entry>` |
//! | `html` | [`html`] | text of elements matching the configured CSS selectors |
//!
//! The payload is first decoded to text (see [`charset`]). Both strategies
//! yield candidates in document order; this module then drops candidates
//! shorter than `min_headline_chars`, removes repeated titles (first
//! occurrence wins) unless `deduplicate` is off, and turns an empty result
//! into [`ExtractErrorKind::NoMatch`] only when `require_match` is set.
//!
//! [`ExtractErrorKind::NoMatch`]: crate::error::ExtractErrorKind::NoMatch

pub mod charset;
pub mod html;
pub mod rss;

use itertools::Itertools;
use scraper::Selector;
use tracing::{debug, info, instrument, warn};

use crate::error::{ConfigError, ExtractError};
use crate::models::{Headline, Target, TargetKind};

/// A CSS selector together with its source text, for logging.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    pub source: String,
    pub selector: Selector,
}

impl CompiledSelector {
    /// Compile a CSS selector, reporting failures as configuration errors.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(source).map_err(|e| ConfigError::selector(source, e))?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }
}

/// Extraction settings shared by both strategies.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub selectors: Vec<CompiledSelector>,
    pub min_headline_chars: usize,
    pub deduplicate: bool,
    pub require_match: bool,
}

impl ExtractOptions {
    /// Compile `selectors` and bundle them with the filtering switches.
    ///
    /// Fails when the list is empty or any selector does not parse.
    pub fn new(
        selectors: &[String],
        min_headline_chars: usize,
        deduplicate: bool,
        require_match: bool,
    ) -> Result<Self, ConfigError> {
        if selectors.is_empty() {
            return Err(ConfigError::Invalid(
                "selectors.html must list at least one CSS selector".to_string(),
            ));
        }
        let selectors = selectors
            .iter()
            .map(|s| CompiledSelector::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            selectors,
            min_headline_chars,
            deduplicate,
            require_match,
        })
    }
}

/// Extract the ordered headlines contained in `payload`.
///
/// # Arguments
///
/// * `payload` - Raw response body
/// * `content_type` - The response `Content-Type`, used as a charset hint
/// * `target` - Decides the strategy and is named in errors
/// * `options` - Selectors and filtering switches
#[instrument(level = "info", skip_all, fields(url = %target, kind = %target.kind(), bytes = payload.len()))]
pub fn extract(
    payload: &[u8],
    content_type: Option<&str>,
    target: &Target,
    options: &ExtractOptions,
) -> Result<Vec<Headline>, ExtractError> {
    let encoding = charset::detect(payload, content_type, target.kind());
    debug!(encoding = encoding.name(), "Decoding payload");
    let (text, _, had_errors) = encoding.decode(payload);
    if had_errors {
        warn!(encoding = encoding.name(), "Payload contained undecodable bytes");
    }

    let candidates = match target.kind() {
        TargetKind::Rss => rss::parse_items(&text, target)?,
        TargetKind::Html => html::select_headlines(&text, target, &options.selectors),
    };
    let found = candidates.len();

    let long_enough = candidates
        .into_iter()
        .filter(|h| h.title.chars().count() >= options.min_headline_chars);
    let headlines: Vec<Headline> = if options.deduplicate {
        long_enough.unique_by(|h| h.title.clone()).collect()
    } else {
        long_enough.collect()
    };
    debug!(found, kept = headlines.len(), "Filtered headline candidates");

    if headlines.is_empty() && options.require_match {
        return Err(ExtractError::no_match(target.to_string()));
    }

    info!(count = headlines.len(), "Extracted headlines");
    Ok(headlines)
}
