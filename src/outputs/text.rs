//! Plain-text output: one headline per line, every line `\n`-terminated.

use crate::models::RunReport;

/// Render every headline title on its own line, in report order.
pub fn render(report: &RunReport) -> String {
    let mut out = String::with_capacity(report.headlines.iter().map(|h| h.title.len() + 1).sum());
    for headline in &report.headlines {
        out.push_str(&headline.title);
        out.push('\n');
    }
    out
}
