//! HTML page scraping with configurable CSS selectors.
//!
//! Selectors are applied one after another in configured order; within one
//! selector, matches come out in document order. The same element can match
//! several selectors (e.g. `h2` and `.headline`); such repeats are dropped by
//! the deduplication pass in the parent module. Each headline records the
//! selector that produced it.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::extract::CompiledSelector;
use crate::models::{Headline, Target};

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Find the link belonging to a headline element: its own `href` when it is
/// an anchor, else the nearest enclosing anchor, else the first anchor inside.
fn headline_href<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    if element.value().name() == "a" {
        return element.value().attr("href");
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .or_else(|| {
            element
                .select(&LINK_SELECTOR)
                .next()
                .and_then(|a| a.value().attr("href"))
        })
}

/// Resolve an href against the page URL, keeping only http(s) results.
fn resolve_link(target: &Target, href: &str) -> Option<String> {
    let resolved = target.url().join(href.trim()).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Select candidate headlines from decoded HTML.
///
/// # Arguments
///
/// * `body` - Page text, already decoded by [`super::charset`]
/// * `target` - The page's Target; relative links resolve against its URL
/// * `selectors` - Applied in order
///
/// # Returns
///
/// Every non-blank match, per selector in document order. HTML parsing never
/// fails, so there is no error case.
pub fn select_headlines(body: &str, target: &Target, selectors: &[CompiledSelector]) -> Vec<Headline> {
    let document = Html::parse_document(body);
    let source = target.to_string();

    let mut headlines = Vec::new();
    for compiled in selectors {
        let before = headlines.len();
        for element in document.select(&compiled.selector) {
            let text = element.text().collect::<String>();
            let Some(headline) = Headline::new(&text, source.as_str()) else {
                continue;
            };
            let link = headline_href(&element).and_then(|href| resolve_link(target, href));
            headlines.push(headline.with_link(link).with_selector(compiled.source.as_str()));
        }
        debug!(
            selector = %compiled.source,
            matched = headlines.len() - before,
            "Applied selector"
        );
    }
    headlines
}
