//! HTML minification for template fragments
//!
//! The backend never touches CSS; inline styles go through the CSS chain
//! before it runs, so they get the same fallbacks and fix-ups as `css`
//! templates.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{Error, Result};
use crate::options::HtmlOptions;
use crate::placeholder::PLACEHOLDER_BASE;

static SVG_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<svg\b").unwrap());

/// Regions the inline CSS pass cares about: comments and scripts are
/// skipped, `<style>` bodies and start tags are rewritten
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)(?P<comment><!--.*?-->)|(?P<script><script\b.*?</script\s*>)|(?P<open><style\b[^>]*>)(?P<body>.*?)(?P<close></style\s*>)|(?P<tag><[a-z][^>]*>)",
    )
    .unwrap()
});

/// A quoted `style` attribute inside one start tag
static STYLE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\sstyle\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Every placeholder form the codec can produce, with or without `;`
static ANY_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}_*\(\);?", regex::escape(PLACEHOLDER_BASE))).unwrap()
});

/// Base of the numbered tokens used while the HTML backend runs
const ORDER_TOKEN_BASE: &str = "@TEMPLATE_EXPRESSION_AT_";

/// Throwaway rule that turns a declaration list into a stylesheet
const STYLE_WRAPPER_PREFIX: &str = "_{";
const STYLE_WRAPPER_SUFFIX: &str = "}";

/// An HTML minifier engine.
pub trait HtmlBackend: Send + Sync {
    /// Name used in log messages
    fn name(&self) -> &'static str;

    fn minify(&self, html: &str, options: &HtmlOptions) -> Result<String>;
}

/// HTML backend built on the `minify-html` crate
pub struct MinifyHtml;

impl HtmlBackend for MinifyHtml {
    fn name(&self) -> &'static str {
        "minify-html"
    }

    fn minify(&self, html: &str, options: &HtmlOptions) -> Result<String> {
        let cfg = minify_html::Cfg {
            keep_closing_tags: options.keep_closing_tags,
            keep_comments: !options.remove_comments,
            keep_html_and_head_opening_tags: options.keep_html_and_head_opening_tags,
            keep_spaces_between_attributes: options.keep_spaces_between_attributes,
            minify_css: false,
            minify_js: options.minify_js,
            remove_bangs: options.remove_bangs,
            remove_processing_instructions: options.remove_processing_instructions,
            ..Default::default()
        };

        let bytes = catch_unwind(AssertUnwindSafe(|| {
            minify_html::minify(html.as_bytes(), &cfg)
        }))
        .map_err(|_| Error::HtmlMinify("minify-html panicked".to_string()))?;

        String::from_utf8(bytes).map_err(|e| Error::HtmlMinify(e.to_string()))
    }
}

/// Remove `\n` and `\r\n` between each `<svg` and the next `</svg`.
///
/// An opening tag without a closing one is left alone. Text outside SVG
/// spans is untouched.
pub fn strip_svg_newlines(html: &str) -> String {
    let mut result = html.to_string();
    let starts: Vec<usize> = SVG_OPEN.find_iter(html).map(|m| m.start()).collect();

    // back to front, so earlier offsets stay valid
    for start in starts.into_iter().rev() {
        let Some(close) = result[start..].find("</svg") else {
            continue;
        };
        let end = start + close;

        let span = &result[start..end];
        if !span.contains('\n') {
            continue;
        }
        let stripped = span.replace("\r\n", "").replace('\n', "");
        result.replace_range(start..end, &stripped);
    }

    result
}

/// Numbered stand-ins for the placeholders of one fragment.
///
/// An HTML backend may reorder attributes, which can move one binding's
/// placeholder past another's. Every placeholder shares one spelling, so the split would
/// silently hand each expression to the wrong binding. Numbering them first
/// turns any reordering into an error.
#[derive(Debug)]
pub struct ExpressionOrder {
    base: String,
    originals: Vec<String>,
}

impl ExpressionOrder {
    /// Replace every placeholder in `html` with a numbered token.
    pub fn number(html: &str) -> (String, Self) {
        let mut base = ORDER_TOKEN_BASE.to_string();
        while html.contains(&base) {
            base.push('_');
        }

        let mut originals = Vec::new();
        let numbered = ANY_PLACEHOLDER
            .replace_all(html, |caps: &Captures| {
                let token = format!("{base}{}();", originals.len());
                originals.push(caps[0].to_string());
                token
            })
            .into_owned();

        (numbered, Self { base, originals })
    }

    /// Swap the numbered tokens back, failing unless they all come out in order.
    pub fn restore(&self, minified: &str) -> Result<String> {
        let mut result = String::with_capacity(minified.len());
        let mut rest = minified;
        let mut next = 0;

        while let Some(pos) = rest.find(&self.base) {
            result.push_str(&rest[..pos]);
            let after = &rest[pos + self.base.len()..];
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();

            let (Ok(index), Some(tail)) = (
                after[..digits].parse::<usize>(),
                after[digits..].strip_prefix("();"),
            ) else {
                return Err(Error::HtmlMinify(
                    "template expression token was rewritten".to_string(),
                ));
            };
            if index != next || index >= self.originals.len() {
                return Err(Error::HtmlMinify(format!(
                    "template expressions were reordered (expected #{next}, found #{index})"
                )));
            }

            result.push_str(&self.originals[index]);
            next += 1;
            rest = tail;
        }

        if next != self.originals.len() {
            return Err(Error::HtmlMinify(format!(
                "{} of {} template expressions survived",
                next,
                self.originals.len()
            )));
        }

        result.push_str(rest);
        Ok(result)
    }
}

/// Run `<style>` bodies and quoted `style` attributes through `minify_css`.
///
/// Only attributes inside start tags are touched; comments, scripts and text
/// are left alone. An attribute is kept as written if the wrapper rule does
/// not survive or the result would contain the attribute's own quote
/// character.
pub fn minify_inline_css(html: &str, minify_css: impl Fn(&str) -> String) -> String {
    MARKUP
        .replace_all(html, |caps: &Captures| {
            if let (Some(open), Some(body), Some(close)) =
                (caps.name("open"), caps.name("body"), caps.name("close"))
            {
                if body.as_str().trim().is_empty() {
                    return caps[0].to_string();
                }
                let open = minify_style_attributes(open.as_str(), &minify_css);
                return format!("{open}{}{}", minify_css(body.as_str()), close.as_str());
            }

            match caps.name("tag") {
                Some(tag) => minify_style_attributes(tag.as_str(), &minify_css),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn minify_style_attributes(tag: &str, minify_css: &impl Fn(&str) -> String) -> String {
    STYLE_ATTRIBUTE
        .replace_all(tag, |caps: &Captures| {
            let (quote, declarations) = match (caps.get(2), caps.get(3)) {
                (Some(value), _) => ('"', value.as_str()),
                (None, Some(value)) => ('\'', value.as_str()),
                (None, None) => return caps[0].to_string(),
            };
            if declarations.trim().is_empty() {
                return caps[0].to_string();
            }

            let wrapped = format!("{STYLE_WRAPPER_PREFIX}{declarations}{STYLE_WRAPPER_SUFFIX}");
            let minified = minify_css(&wrapped);

            match minified
                .strip_prefix(STYLE_WRAPPER_PREFIX)
                .and_then(|rest| rest.strip_suffix(STYLE_WRAPPER_SUFFIX))
            {
                Some(inner) if !inner.contains(quote) => {
                    format!("{}{quote}{inner}{quote}", &caps[1])
                }
                _ => {
                    tracing::debug!("keeping style attribute as written: {}", declarations);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}
