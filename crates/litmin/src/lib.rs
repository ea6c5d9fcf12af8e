//! # litmin
//!
//! Minifies the HTML and CSS embedded in tagged template literals of
//! JavaScript and TypeScript modules, leaving every `${…}` expression
//! byte-for-byte intact.
//!
//! The pipeline for one file:
//! - **Locate**: parse the module with OXC and collect the templates whose tag
//!   (`html`, `svg`, `css`, or `lit.html` style members) is configured
//! - **Combine**: join each template's static parts with a placeholder that
//!   occurs nowhere in them
//! - **Minify**: minify-html for HTML, a lightningcss → grass → built-in
//!   fallback chain for CSS
//! - **Split**: cut the minified text back into one segment per part and splice
//!   the segments into the source
//!
//! ## Example
//!
//! ```text
//! use litmin::{DefaultStrategy, MinifyOptions, transform};
//!
//! let source = "const styles = css`.foo { width: ${width}; }`;";
//! let strategy = DefaultStrategy::new();
//! if let Some(output) = transform(source, "styles.js", &MinifyOptions::default(), &strategy)? {
//!     println!("{}", output.code);
//! }
//! ```

pub mod css;
mod error;
pub mod html;
mod locate;
mod options;
pub mod placeholder;
mod strategy;
mod transform;

pub use error::{CssBackendError, Error, Result};
pub use locate::{TagSet, Template, TemplateKind, TemplatePart, Templates, locate, source_type_for};
pub use options::{
    BoxError, BrowserTargets, CssOptions, CustomCssMinifier, FallbackMinifier, HtmlOptions,
    MinifyOptions,
};
pub use strategy::{DefaultStrategy, DefaultStrategyBuilder, Strategy};
pub use transform::{TransformOutput, transform};
