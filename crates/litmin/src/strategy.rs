//! Minification strategy
//!
//! [`Strategy`] is everything [`crate::transform`] needs from a minifier: the
//! placeholder codec and one entry point each for HTML and CSS.
//! [`DefaultStrategy`] is the stock implementation.

use crate::css::{CssBackend, CssChain, discover_fallback, discover_primary};
use crate::html::{
    ExpressionOrder, HtmlBackend, MinifyHtml, minify_inline_css, strip_svg_newlines,
};
use crate::locate::TemplatePart;
use crate::options::{CssOptions, MinifyOptions};
use crate::{Result, placeholder};

/// A minification strategy.
///
/// The codec methods have default implementations; a strategy only needs to
/// override them if its minifiers mangle the default placeholder.
pub trait Strategy: Send + Sync {
    /// A placeholder that occurs in none of `parts`
    fn placeholder(&self, parts: &[TemplatePart]) -> String {
        placeholder::placeholder(parts)
    }

    fn combine_html_strings(&self, parts: &[TemplatePart], placeholder: &str) -> String {
        placeholder::combine_html_strings(parts, placeholder)
    }

    /// Minify an HTML fragment. Errors leave the template unminified.
    fn minify_html(&self, html: &str, options: &MinifyOptions) -> Result<String>;

    /// Minify CSS. Never fails: the worst case is the input unchanged.
    fn minify_css(&self, css: &str, options: &CssOptions) -> String;

    fn split_html_by_placeholder(&self, html: &str, placeholder: &str) -> Vec<String> {
        placeholder::split_html_by_placeholder(html, placeholder)
    }
}

/// minify-html for HTML, the lightningcss/grass/built-in chain for CSS.
pub struct DefaultStrategy {
    html: Box<dyn HtmlBackend>,
    css: CssChain,
}

impl DefaultStrategy {
    /// Every backend that was compiled in
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> DefaultStrategyBuilder {
        DefaultStrategyBuilder {
            html: None,
            primary: discover_primary(),
            fallback: discover_fallback(),
        }
    }

    pub fn css_chain(&self) -> &CssChain {
        &self.css
    }
}

impl Default for DefaultStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for DefaultStrategy {
    fn minify_html(&self, html: &str, options: &MinifyOptions) -> Result<String> {
        let html = if options.minify_css {
            minify_inline_css(html, |css| self.minify_css(css, &options.css))
        } else {
            html.to_string()
        };

        let (numbered, order) = ExpressionOrder::number(&html);
        let minified = self.html.minify(&numbered, &options.html)?;
        let minified = order.restore(&minified)?;

        if options.html.collapse_whitespace {
            Ok(strip_svg_newlines(&minified))
        } else {
            Ok(minified)
        }
    }

    fn minify_css(&self, css: &str, options: &CssOptions) -> String {
        self.css.minify(css, options)
    }
}

/// Builder for [`DefaultStrategy`], starting from the discovered backends.
pub struct DefaultStrategyBuilder {
    html: Option<Box<dyn HtmlBackend>>,
    primary: Option<Box<dyn CssBackend>>,
    fallback: Option<Box<dyn CssBackend>>,
}

impl DefaultStrategyBuilder {
    pub fn html_backend(mut self, backend: impl HtmlBackend + 'static) -> Self {
        self.html = Some(Box::new(backend));
        self
    }

    pub fn css_primary(mut self, backend: impl CssBackend + 'static) -> Self {
        self.primary = Some(Box::new(backend));
        self
    }

    /// Skip the primary CSS backend even if it was compiled in
    pub fn without_primary(mut self) -> Self {
        self.primary = None;
        self
    }

    pub fn css_fallback(mut self, backend: impl CssBackend + 'static) -> Self {
        self.fallback = Some(Box::new(backend));
        self
    }

    /// Skip the fallback CSS backend even if it was compiled in
    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn build(self) -> DefaultStrategy {
        let html = self.html.unwrap_or_else(|| Box::new(MinifyHtml));
        tracing::debug!("HTML backend: {}", html.name());

        DefaultStrategy {
            html,
            css: CssChain::new(self.primary, self.fallback),
        }
    }
}
