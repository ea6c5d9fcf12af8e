//! Last-resort CSS minifier built from structural text rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CssBackendError;
use crate::placeholder::PLACEHOLDER_BASE;

static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SEMICOLON_BEFORE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";\s*\}").unwrap());
static AROUND_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\{\s*").unwrap());
static AROUND_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\}\s*").unwrap());
// Only after the colon: `.a :hover` must keep its descendant space
static AFTER_COLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\s*").unwrap());
static AROUND_SEMICOLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*;\s*").unwrap());
/// Text ending in a placeholder whose `;` comes next
static BEFORE_PLACEHOLDER_SEMICOLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}_*\(\)$", regex::escape(PLACEHOLDER_BASE))).unwrap()
});

/// Minify CSS without parsing it.
///
/// Fails on an unterminated block comment or unbalanced braces, where the
/// rules below would corrupt the stylesheet.
pub fn minify_builtin(css: &str) -> Result<String, CssBackendError> {
    let css = BLOCK_COMMENT.replace_all(css, "");
    if css.contains("/*") {
        return Err(CssBackendError::Unbalanced(
            "unterminated block comment".to_string(),
        ));
    }

    let open = css.matches('{').count();
    let close = css.matches('}').count();
    if open != close {
        return Err(CssBackendError::Unbalanced(format!(
            "unbalanced braces ({open} opening, {close} closing)"
        )));
    }

    let css = WHITESPACE.replace_all(&css, " ");
    let css = SEMICOLON_BEFORE_CLOSE.replace_all(&css, "}");
    let css = AROUND_OPEN.replace_all(&css, "{");
    let css = AROUND_CLOSE.replace_all(&css, "}");
    let css = AFTER_COLON.replace_all(&css, ":");
    let css = collapse_semicolons(&css);

    Ok(css.trim().to_string())
}

/// Remove whitespace around `;`, except after a placeholder's own `;`: what
/// follows it is the next part's static text (`margin: ${x} ${y}`).
fn collapse_semicolons(css: &str) -> String {
    let mut result = String::with_capacity(css.len());
    let mut last = 0;

    for m in AROUND_SEMICOLON.find_iter(css) {
        result.push_str(&css[last..m.start()]);
        if BEFORE_PLACEHOLDER_SEMICOLON.is_match(&css[..m.start()]) {
            result.push_str(m.as_str().trim_start());
        } else {
            result.push(';');
        }
        last = m.end();
    }
    result.push_str(&css[last..]);

    result
}
