//! Error types for template location and minification

use thiserror::Error;

/// Errors surfaced to the host for one source file.
///
/// Only [`Error::Parse`] and [`Error::MalformedTemplate`] ever escape
/// [`crate::transform`]. [`Error::HtmlMinify`] and
/// [`Error::PartCountMismatch`] are recovered there by leaving the affected
/// template unminified.
#[derive(Debug, Error)]
pub enum Error {
    /// The source could not be parsed (unbalanced template literal, etc.)
    #[error("{file}: failed to parse source: {message}")]
    Parse { file: String, message: String },

    /// A located template does not line up with the source text
    #[error("{file}: malformed template literal at byte {offset}: {message}")]
    MalformedTemplate {
        file: String,
        offset: usize,
        message: String,
    },

    /// The HTML backend failed on one template
    #[error("HTML minification failed: {0}")]
    HtmlMinify(String),

    /// Minified text no longer splits into one segment per template part
    #[error("minified template split into {found} parts, expected {expected}")]
    PartCountMismatch { expected: usize, found: usize },

    /// The options document could not be deserialized
    #[error("invalid minify options: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// Result type alias for litmin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of one CSS minification step.
///
/// These never leave [`crate::Strategy::minify_css`]; they are logged and the
/// next step of the chain is tried.
#[derive(Debug, Error)]
pub enum CssBackendError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("minify error: {0}")]
    Minify(String),

    #[error("printer error: {0}")]
    Print(String),

    /// Error returned by a caller-supplied minifier
    #[error("custom minifier failed: {0}")]
    Custom(String),

    /// The backend panicked
    #[error("backend panicked: {0}")]
    Panicked(String),

    /// The input is not structurally sound enough to minify
    #[error("{0}")]
    Unbalanced(String),

    /// The output has a different number of template placeholders than the input
    #[error("output has {found} template placeholders, input had {expected}")]
    LostPlaceholders { expected: usize, found: usize },
}
