//! Reassembly: minify every located template and splice it back.

use crate::locate::{Template, TemplateKind, locate};
use crate::options::MinifyOptions;
use crate::strategy::Strategy;
use crate::{Error, Result};

/// A transformed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub code: String,
    /// Templates located in the source
    pub templates: usize,
    /// Templates whose text actually changed
    pub minified: usize,
}

/// One part replacement, as a byte range of the original source
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// Minify the HTML and CSS templates in `source`.
///
/// Returns `Ok(None)` if no template matched, so the caller can pass the file
/// through untouched. Expressions are never rewritten by the template they
/// belong to; a nested template inside one is handled on its own.
pub fn transform(
    source: &str,
    file: &str,
    options: &MinifyOptions,
    strategy: &dyn Strategy,
) -> Result<Option<TransformOutput>> {
    let templates = locate(source, file, &options.tag_set())?;
    if templates.len() == 0 {
        return Ok(None);
    }

    let located = templates.len();
    let mut minified = 0;
    let mut edits = Vec::new();

    for template in templates {
        let Some(texts) = minify_template(&template, file, options, strategy) else {
            continue;
        };

        let before = edits.len();
        for (part, text) in template.parts.iter().zip(texts) {
            if text != part.text {
                edits.push(Edit {
                    start: part.start,
                    end: part.end,
                    text,
                });
            }
        }
        if edits.len() > before {
            minified += 1;
        }
    }

    // descending start: last to first, innermost to outermost
    edits.sort_by(|a, b| b.start.cmp(&a.start));

    let mut code = source.to_string();
    for edit in edits {
        code.replace_range(edit.start..edit.end, &edit.text);
    }

    tracing::debug!(
        "{}: minified {} of {} template(s)",
        file,
        minified,
        located
    );

    Ok(Some(TransformOutput {
        code,
        templates: located,
        minified,
    }))
}

/// The minified text of each part, or `None` to leave the template alone.
fn minify_template(
    template: &Template,
    file: &str,
    options: &MinifyOptions,
    strategy: &dyn Strategy,
) -> Option<Vec<String>> {
    let placeholder = strategy.placeholder(&template.parts);
    let combined = strategy.combine_html_strings(&template.parts, &placeholder);

    let minified = match template.kind {
        TemplateKind::Html => match strategy.minify_html(&combined, options) {
            Ok(minified) => minified,
            Err(e) => {
                tracing::warn!(
                    "{}: {} template at byte {} left unminified: {}",
                    file,
                    template.tag,
                    template.span.start,
                    e
                );
                return None;
            }
        },
        TemplateKind::Css if options.minify_css => strategy.minify_css(&combined, &options.css),
        TemplateKind::Css => return None,
    };

    let texts = strategy.split_html_by_placeholder(&minified, &placeholder);
    if texts.len() != template.parts.len() {
        let e = Error::PartCountMismatch {
            expected: template.parts.len(),
            found: texts.len(),
        };
        tracing::warn!(
            "{}: {} template at byte {} left unminified: {}",
            file,
            template.tag,
            template.span.start,
            e
        );
        return None;
    }

    Some(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CssOptions;

    /// Upper-cases HTML (placeholders are already upper case), drops CSS whitespace
    struct Shouty;

    impl Strategy for Shouty {
        fn minify_html(&self, html: &str, _options: &MinifyOptions) -> Result<String> {
            Ok(html.to_uppercase())
        }

        fn minify_css(&self, css: &str, _options: &CssOptions) -> String {
            css.split_whitespace().collect()
        }
    }

    /// Eats one placeholder
    struct Lossy;

    impl Strategy for Lossy {
        fn minify_html(&self, html: &str, _options: &MinifyOptions) -> Result<String> {
            Ok(html.replacen("@TEMPLATE_EXPRESSION();", "", 1))
        }

        fn minify_css(&self, css: &str, _options: &CssOptions) -> String {
            css.to_string()
        }
    }

    struct Erroring;

    impl Strategy for Erroring {
        fn minify_html(&self, _html: &str, _options: &MinifyOptions) -> Result<String> {
            Err(Error::HtmlMinify("boom".to_string()))
        }

        fn minify_css(&self, css: &str, _options: &CssOptions) -> String {
            css.to_string()
        }
    }

    fn run(source: &str, strategy: &dyn Strategy) -> Option<TransformOutput> {
        transform(source, "test.js", &MinifyOptions::default(), strategy).unwrap()
    }

    #[test]
    fn test_no_templates() {
        assert_eq!(run("const a = `plain ${b}`;", &Shouty), None);
    }

    #[test]
    fn test_parts_replaced_expressions_kept() {
        let source = "const t = html`<p>${ name }</p>`;";
        let output = run(source, &Shouty).unwrap();

        assert_eq!(output.code, "const t = html`<P>${ name }</P>`;");
        assert_eq!(output.templates, 1);
        assert_eq!(output.minified, 1);
    }

    #[test]
    fn test_nested_templates() {
        let source = "html`<ul>${items.map(i => html`<li>${i}</li>`)}</ul>`";
        let output = run(source, &Shouty).unwrap();

        assert_eq!(
            output.code,
            "html`<UL>${items.map(i => html`<LI>${i}</LI>`)}</UL>`"
        );
        assert_eq!(output.templates, 2);
        assert_eq!(output.minified, 2);
    }

    #[test]
    fn test_unchanged_template_not_counted() {
        let source = "html`${a}`; css`.a{}`";
        let output = run(source, &Shouty).unwrap();

        assert_eq!(output.code, source);
        assert_eq!(output.templates, 2);
        assert_eq!(output.minified, 0);
    }

    #[test]
    fn test_css_toggle() {
        let source = "css`.a { color: red; }`";
        let options = MinifyOptions {
            minify_css: false,
            ..MinifyOptions::default()
        };

        let output = transform(source, "test.js", &options, &Shouty)
            .unwrap()
            .unwrap();
        assert_eq!(output.code, source);

        let output = run(source, &Shouty).unwrap();
        assert_eq!(output.code, "css`.a{color:red;}`");
    }

    #[test]
    fn test_part_count_mismatch_leaves_template() {
        let source = "html`<a>${x}</a>` + html`<b> </b>`";
        let output = run(source, &Lossy).unwrap();

        assert_eq!(output.code, source);
        assert_eq!(output.minified, 0);
    }

    #[test]
    fn test_html_error_leaves_template() {
        let source = "html`<p> ${x} </p>`";
        let output = run(source, &Erroring).unwrap();
        assert_eq!(output.code, source);
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let err = transform("html`<p>${x</p>", "bad.js", &MinifyOptions::default(), &Shouty)
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
