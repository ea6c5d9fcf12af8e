//! Text-patching passes applied to minifier output
//!
//! Every pass is a heuristic over an immutable original/minified pair; they
//! are order-dependent.

use std::sync::LazyLock;

use regex::Regex;

use crate::placeholder::PLACEHOLDER_BASE;

/// `pseudo(arguments){`, greedy and line-oriented
static PSEUDO_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(::?.+\((.*)\))\s*\{").unwrap());

/// A placeholder (possibly mangled between base and parens) without its semicolon
static LOOSE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}[^;()]*\(\)", regex::escape(PLACEHOLDER_BASE))).unwrap()
});

/// An intact placeholder, as produced by the codec
static STRICT_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}_*\(\)", regex::escape(PLACEHOLDER_BASE))).unwrap()
});

/// An intact placeholder with its own semicolon
static TERMINATED_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}_*\(\);", regex::escape(PLACEHOLDER_BASE))).unwrap()
});

/// Restore whitespace that a minifier stripped from pseudo-class arguments.
///
/// `::part(input focused)` and `::part(inputfocused)` select different
/// things. For every such selector in `original` whose arguments contain
/// whitespace, the first occurrence of its stripped form in `minified` is
/// replaced with the original text. Forms that cannot be found are skipped.
///
/// The first occurrence is not necessarily the matching one when identical
/// selectors repeat.
pub fn fix_pseudo_class_spaces(original: &str, minified: &str) -> String {
    let mut result = minified.to_string();

    for caps in PSEUDO_CLASS.captures_iter(original) {
        let pseudo_class = &caps[1];
        let parameters = &caps[2];
        if !parameters.chars().any(char::is_whitespace) {
            continue;
        }

        let stripped_parameters: String = parameters
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let stripped = pseudo_class.replacen(parameters, &stripped_parameters, 1);

        let Some(index) = result.find(&stripped) else {
            continue;
        };
        result.replace_range(index..index + stripped.len(), pseudo_class);
    }

    result
}

/// Append `;` to every placeholder not already followed by one.
pub fn fix_template_expressions(css: &str) -> String {
    let mut result = String::with_capacity(css.len() + 8);
    let mut last = 0;

    for m in LOOSE_PLACEHOLDER.find_iter(css) {
        result.push_str(&css[last..m.end()]);
        if !css[m.end()..].starts_with(';') {
            result.push(';');
        }
        last = m.end();
    }
    result.push_str(&css[last..]);

    result
}

/// Put back the static `;` that followed a placeholder in `original`.
///
/// In `color: @TEMPLATE_EXPRESSION();; margin: 0` the placeholder's own `;`
/// ends the declaration, so minifiers drop the second one as an empty
/// statement and the expression runs into `margin`. Dropping it before a `}`
/// or at the end is harmless and left as is. Output whose placeholder count
/// differs from the original is returned unchanged.
pub fn fix_statement_semicolons(original: &str, minified: &str) -> String {
    let expected: Vec<bool> = TERMINATED_PLACEHOLDER
        .find_iter(original)
        .map(|m| original[m.end()..].starts_with(';'))
        .collect();
    let found: Vec<_> = TERMINATED_PLACEHOLDER.find_iter(minified).collect();
    if found.len() != expected.len() {
        return minified.to_string();
    }

    let mut result = String::with_capacity(minified.len() + expected.len());
    let mut last = 0;
    for (m, had_semicolon) in found.iter().zip(expected) {
        result.push_str(&minified[last..m.end()]);
        let rest = &minified[m.end()..];
        if had_semicolon && !(rest.is_empty() || rest.starts_with([';', '}'])) {
            result.push(';');
        }
        last = m.end();
    }
    result.push_str(&minified[last..]);

    result
}

/// Number of intact placeholders in `text`
pub fn count_placeholders(text: &str) -> usize {
    STRICT_PLACEHOLDER.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_spaces_restored() {
        let original = ".element::part(input focused) { color: red; }";
        let minified = ".element::part(inputfocused){color:red}";
        assert_eq!(
            fix_pseudo_class_spaces(original, minified),
            ".element::part(input focused){color:red}"
        );
    }

    #[test]
    fn test_selector_on_its_own_line() {
        let original = ".a {}\n:host::part(label  big)\n{\n  color: red;\n}\n";
        let minified = ".a{}:host::part(labelbig){color:red}";
        assert_eq!(
            fix_pseudo_class_spaces(original, minified),
            ".a{}:host::part(label  big){color:red}"
        );
    }

    #[test]
    fn test_missing_form_is_skipped() {
        let original = ".x::part(a b) { color: red; }";
        let minified = ".x::part(rewritten){color:red}";
        assert_eq!(fix_pseudo_class_spaces(original, minified), minified);
    }

    #[test]
    fn test_no_whitespace_is_untouched() {
        let original = ".x:not(.y) { color: red; }";
        let minified = ".x:not(.y){color:red}";
        assert_eq!(fix_pseudo_class_spaces(original, minified), minified);
    }

    #[test]
    fn test_only_first_occurrence_restored() {
        let original = ".a::part(x y) { color: red; }";
        let minified = ".a::part(xy){color:red}.b::part(xy){color:blue}";
        assert_eq!(
            fix_pseudo_class_spaces(original, minified),
            ".a::part(x y){color:red}.b::part(xy){color:blue}"
        );
    }

    #[test]
    fn test_semicolon_appended() {
        assert_eq!(
            fix_template_expressions(".class{color:@TEMPLATE_EXPRESSION_ABC()}"),
            ".class{color:@TEMPLATE_EXPRESSION_ABC();}"
        );
    }

    #[test]
    fn test_existing_semicolon_kept() {
        let css = ".a{b:@TEMPLATE_EXPRESSION();c:@TEMPLATE_EXPRESSION()}";
        assert_eq!(
            fix_template_expressions(css),
            ".a{b:@TEMPLATE_EXPRESSION();c:@TEMPLATE_EXPRESSION();}"
        );
    }

    #[test]
    fn test_trailing_placeholder() {
        assert_eq!(
            fix_template_expressions(".heading{font-size:24px}@TEMPLATE_EXPRESSION()"),
            ".heading{font-size:24px}@TEMPLATE_EXPRESSION();"
        );
    }

    #[test]
    fn test_statement_semicolon_restored() {
        let original = "_{color: @TEMPLATE_EXPRESSION();; margin: 0}";
        let minified = "_{color:@TEMPLATE_EXPRESSION();margin:0}";
        assert_eq!(
            fix_statement_semicolons(original, minified),
            "_{color:@TEMPLATE_EXPRESSION();;margin:0}"
        );
    }

    #[test]
    fn test_statement_semicolon_before_brace_not_needed() {
        let original = ".a { color: @TEMPLATE_EXPRESSION();; }";
        let minified = ".a{color:@TEMPLATE_EXPRESSION();}";
        assert_eq!(fix_statement_semicolons(original, minified), minified);
    }

    #[test]
    fn test_value_continuation_untouched() {
        // `margin: ${x} ${y};` has no `;` right after the first expression
        let original = ".b { margin: @TEMPLATE_EXPRESSION(); @TEMPLATE_EXPRESSION();; }";
        let minified = ".b{margin:@TEMPLATE_EXPRESSION(); @TEMPLATE_EXPRESSION();}";
        assert_eq!(fix_statement_semicolons(original, minified), minified);
    }

    #[test]
    fn test_count_placeholders() {
        assert_eq!(
            count_placeholders("@TEMPLATE_EXPRESSION();x@TEMPLATE_EXPRESSION__()"),
            2
        );
        assert_eq!(count_placeholders("@TEMPLATE_EXPRESSION ();"), 0);
    }
}
