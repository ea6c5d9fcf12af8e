//! Fallback CSS backend: grass in compressed output mode.
//!
//! Plain CSS is valid SCSS, so the compiler doubles as a tolerant minifier.

use super::CssBackend;
use crate::error::CssBackendError;
use crate::options::CssOptions;

pub struct Grass;

impl CssBackend for Grass {
    fn name(&self) -> &'static str {
        "grass"
    }

    fn minify(&self, css: &str, _options: &CssOptions) -> Result<String, CssBackendError> {
        let options = grass::Options::default()
            .style(grass::OutputStyle::Compressed)
            .quiet(true);

        grass::from_string(css.to_string(), &options)
            .map(|compiled| compiled.trim().to_string())
            .map_err(|e| CssBackendError::Minify(e.to_string()))
    }
}
