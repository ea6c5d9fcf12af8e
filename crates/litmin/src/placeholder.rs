//! Placeholder codec
//!
//! Expressions are swapped for a token shaped like a CSS at-rule call
//! (`@TEMPLATE_EXPRESSION();`). CSS minifiers keep unknown at-rules, but may
//! drop the trailing semicolon (before a `}`, or in inline styles), so
//! splitting also accepts the token without it.

use crate::locate::TemplatePart;

/// Base token; also what the semicolon fix-up looks for
pub const PLACEHOLDER_BASE: &str = "@TEMPLATE_EXPRESSION";

/// Call-like suffix that keeps the token alive through CSS minifiers
pub const PLACEHOLDER_SUFFIX: &str = "();";

/// A placeholder that occurs in none of `parts`.
///
/// The base token is padded with `_` until neither the full placeholder nor
/// its semicolon-less form appears in any part's text.
pub fn placeholder(parts: &[TemplatePart]) -> String {
    let bare_suffix = PLACEHOLDER_SUFFIX.trim_end_matches(';');
    let mut base = PLACEHOLDER_BASE.to_string();
    while parts.iter().any(|part| {
        let bare = format!("{base}{bare_suffix}");
        part.text.contains(&bare)
    }) {
        base.push('_');
    }

    tracing::trace!("using placeholder {base}{PLACEHOLDER_SUFFIX}");
    format!("{base}{PLACEHOLDER_SUFFIX}")
}

/// Join part texts with the placeholder.
pub fn combine_html_strings(parts: &[TemplatePart], placeholder: &str) -> String {
    parts
        .iter()
        .map(|part| part.text.as_str())
        .collect::<Vec<_>>()
        .join(placeholder)
}

/// Split minified text back into parts.
///
/// When the placeholder ends in `;`, each segment is split again on the
/// placeholder without it, so a dropped semicolon still yields a boundary.
pub fn split_html_by_placeholder(html: &str, placeholder: &str) -> Vec<String> {
    let segments = html.split(placeholder);

    match placeholder.strip_suffix(';') {
        Some(without_semicolon) if !without_semicolon.is_empty() => segments
            .flat_map(|segment| segment.split(without_semicolon))
            .map(str::to_string)
            .collect(),
        _ => segments.map(str::to_string).collect(),
    }
}
