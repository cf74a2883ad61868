//! Extraction of the remote application directory from `.pushand`

/// Directive prefix that precedes the application directory name
pub const PUSHAND_DIRECTIVE: &str = "phd $0 ";

/// Return the text following `directive` on the first line that starts with it.
///
/// Only the first matching line counts. Lines whose remainder is empty do not
/// match. Returns `None` when the input ends without a match.
pub fn extract_marker<'a>(text: &'a str, directive: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let captured = line.strip_prefix(directive)?.trim_end();
        (!captured.is_empty()).then_some(captured)
    })
}
