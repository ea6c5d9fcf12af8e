//! Minification options
//!
//! Options are resolved once per source file and threaded through the whole
//! pipeline. Every struct deserializes with `#[serde(default)]`, so a partial
//! YAML document only overrides the fields it names.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::Result;
use crate::locate::TagSet;

/// Options for one `transform` call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MinifyOptions {
    /// Tag names whose templates are minified as HTML
    pub html_tags: Vec<String>,

    /// Tag names whose templates are minified as CSS
    pub css_tags: Vec<String>,

    /// Whether CSS is minified at all (`css` templates, `<style>` bodies and
    /// `style` attributes)
    pub minify_css: bool,

    /// Options passed through to the HTML backend
    pub html: HtmlOptions,

    /// Options for the CSS fallback chain and its fix-ups
    pub css: CssOptions,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            html_tags: vec!["html".to_string(), "svg".to_string()],
            css_tags: vec!["css".to_string()],
            minify_css: true,
            html: HtmlOptions::default(),
            css: CssOptions::default(),
        }
    }
}

impl MinifyOptions {
    /// Parse options from YAML, filling every missing field with its default.
    ///
    /// ```yaml
    /// css_tags: [css, styles]
    /// css:
    ///   fallback: none
    ///   targets:
    ///     safari: 15
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The tag names the locator should look for
    pub fn tag_set(&self) -> TagSet {
        TagSet::new(self.html_tags.clone(), self.css_tags.clone())
    }
}

/// Options for the HTML backend.
///
/// Mirrors the subset of `minify-html` knobs that make sense for template
/// fragments. `collapse_whitespace` also gates the SVG newline pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HtmlOptions {
    pub collapse_whitespace: bool,
    pub remove_comments: bool,
    /// Fragments are often split across templates, so closing tags are kept
    pub keep_closing_tags: bool,
    pub keep_html_and_head_opening_tags: bool,
    pub keep_spaces_between_attributes: bool,
    pub minify_js: bool,
    pub remove_bangs: bool,
    pub remove_processing_instructions: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            collapse_whitespace: true,
            remove_comments: true,
            keep_closing_tags: true,
            keep_html_and_head_opening_tags: true,
            keep_spaces_between_attributes: false,
            minify_js: false,
            remove_bangs: false,
            remove_processing_instructions: false,
        }
    }
}

/// Options for CSS minification.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CssOptions {
    /// Browser targets for the primary backend
    pub targets: BrowserTargets,

    /// Parse CSS nesting
    pub nesting: bool,

    /// Parse `@custom-media` rules
    pub custom_media: bool,

    /// Restore whitespace inside pseudo-class arguments, e.g. `::part(a b)`
    pub fix_pseudo_class_spaces: bool,

    /// Re-append semicolons dropped after template placeholders
    pub preserve_template_expressions: bool,

    /// Backend tried when the primary one fails or is unavailable
    pub fallback: FallbackMinifier,

    /// Tried before any backend
    #[serde(skip)]
    pub custom_minifier: Option<CustomCssMinifier>,
}

impl Default for CssOptions {
    fn default() -> Self {
        Self {
            targets: BrowserTargets::default(),
            nesting: true,
            custom_media: true,
            fix_pseudo_class_spaces: true,
            preserve_template_expressions: true,
            fallback: FallbackMinifier::default(),
            custom_minifier: None,
        }
    }
}

/// Minimum browser major versions.
///
/// Unset browsers are not targeted. The default is a modern baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BrowserTargets {
    pub android: Option<u32>,
    pub chrome: Option<u32>,
    pub edge: Option<u32>,
    pub firefox: Option<u32>,
    pub ie: Option<u32>,
    pub ios_saf: Option<u32>,
    pub opera: Option<u32>,
    pub safari: Option<u32>,
    pub samsung: Option<u32>,
}

impl Default for BrowserTargets {
    fn default() -> Self {
        Self {
            android: None,
            chrome: Some(90),
            edge: Some(90),
            firefox: Some(88),
            ie: None,
            ios_saf: None,
            opera: None,
            safari: Some(14),
            samsung: None,
        }
    }
}

/// Which backend to fall back to after the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMinifier {
    /// Compressed output from the `grass` Sass compiler
    #[default]
    Grass,
    /// Go straight to the built-in minifier
    None,
}

/// Boxed error returned by custom minifiers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type CustomFn = dyn Fn(&str) -> std::result::Result<String, BoxError> + Send + Sync;

/// A caller-supplied CSS minifier.
#[derive(Clone)]
pub struct CustomCssMinifier(Arc<CustomFn>);

impl CustomCssMinifier {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, css: &str) -> std::result::Result<String, BoxError> {
        (self.0)(css)
    }
}

impl fmt::Debug for CustomCssMinifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCssMinifier(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_plugin_defaults() {
        let options = MinifyOptions::default();
        assert!(options.minify_css);
        assert!(options.css.fix_pseudo_class_spaces);
        assert!(options.css.preserve_template_expressions);
        assert_eq!(options.css.fallback, FallbackMinifier::Grass);
        assert_eq!(options.css.targets.chrome, Some(90));
        assert_eq!(options.css.targets.firefox, Some(88));
        assert_eq!(options.css.targets.safari, Some(14));
        assert_eq!(options.css.targets.edge, Some(90));
        assert!(options.css.nesting && options.css.custom_media);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = r#"
css_tags: [css, styles]
css:
  fallback: none
  targets:
    safari: 15
html:
  remove_comments: false
"#;
        let options = MinifyOptions::from_yaml_str(yaml).unwrap();
        assert_eq!(options.css_tags, vec!["css", "styles"]);
        assert_eq!(options.html_tags, vec!["html", "svg"]);
        assert_eq!(options.css.fallback, FallbackMinifier::None);
        assert_eq!(options.css.targets.safari, Some(15));
        // Browsers missing from a partial `targets` table keep the baseline
        assert_eq!(options.css.targets.chrome, Some(90));
        assert!(!options.html.remove_comments);
        assert!(options.html.collapse_whitespace);
        assert!(options.css.fix_pseudo_class_spaces);
    }

    #[test]
    fn empty_yaml_is_default() {
        let options = MinifyOptions::from_yaml_str("  \n").unwrap();
        assert_eq!(options.css_tags, vec!["css"]);
    }

    #[test]
    fn invalid_yaml_is_config_error() {
        let err = MinifyOptions::from_yaml_str("css: [not, a, table]").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn custom_minifier_is_callable() {
        let custom = CustomCssMinifier::new(|css| Ok(css.trim().to_string()));
        assert_eq!(custom.call("  a{}  ").unwrap(), "a{}");
        assert_eq!(format!("{custom:?}"), "CustomCssMinifier(..)");
    }
}
