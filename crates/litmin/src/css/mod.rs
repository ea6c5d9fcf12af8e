//! CSS minification chain
//!
//! Steps, in order: caller-supplied minifier, primary backend (lightningcss),
//! fallback backend (grass), built-in minifier. A failing step is logged and
//! the next one is tried; if even the built-in minifier fails the input is
//! returned unchanged. CSS minification never fails a build.

mod builtin;
mod fixups;
#[cfg(feature = "grass")]
mod grass;
#[cfg(feature = "lightningcss")]
mod lightning;

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

pub use builtin::minify_builtin;
pub use fixups::{
    count_placeholders, fix_pseudo_class_spaces, fix_statement_semicolons, fix_template_expressions,
};

use crate::error::CssBackendError;
use crate::options::{CssOptions, FallbackMinifier};

/// A CSS minifier engine.
pub trait CssBackend: Send + Sync {
    /// Name used in log messages
    fn name(&self) -> &'static str;

    fn minify(&self, css: &str, options: &CssOptions) -> Result<String, CssBackendError>;
}

/// The primary backend, if compiled in.
pub fn discover_primary() -> Option<Box<dyn CssBackend>> {
    #[cfg(feature = "lightningcss")]
    {
        Some(Box::new(lightning::LightningCss))
    }
    #[cfg(not(feature = "lightningcss"))]
    {
        None
    }
}

/// The named fallback backend, if compiled in.
pub fn discover_fallback() -> Option<Box<dyn CssBackend>> {
    #[cfg(feature = "grass")]
    {
        Some(Box::new(grass::Grass))
    }
    #[cfg(not(feature = "grass"))]
    {
        None
    }
}

/// Resolved CSS backends. Read-only once built; shared across transforms.
pub struct CssChain {
    primary: Option<Box<dyn CssBackend>>,
    fallback: Option<Box<dyn CssBackend>>,
}

impl CssChain {
    pub fn new(
        primary: Option<Box<dyn CssBackend>>,
        fallback: Option<Box<dyn CssBackend>>,
    ) -> Self {
        tracing::debug!(
            "CSS backends: primary={}, fallback={}",
            primary.as_ref().map_or("unavailable", |b| b.name()),
            fallback.as_ref().map_or("unavailable", |b| b.name()),
        );
        Self { primary, fallback }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Minify `css`, descending the chain until a step succeeds.
    pub fn minify(&self, css: &str, options: &CssOptions) -> String {
        let expected = count_placeholders(css);

        if let Some(custom) = &options.custom_minifier {
            let result = attempt("custom", css, expected, options, || {
                custom
                    .call(css)
                    .map_err(|e| CssBackendError::Custom(e.to_string()))
            });
            if let Some(minified) = result {
                return minified;
            }
        }

        if let Some(primary) = &self.primary {
            let result = attempt(primary.name(), css, expected, options, || {
                primary.minify(css, options)
            });
            if let Some(minified) = result {
                return minified;
            }
        }

        if options.fallback != FallbackMinifier::None
            && let Some(fallback) = &self.fallback
        {
            let result = attempt(fallback.name(), css, expected, options, || {
                fallback.minify(css, options)
            });
            if let Some(minified) = result {
                return minified;
            }
        }

        match attempt("built-in", css, expected, options, || minify_builtin(css)) {
            Some(minified) => minified,
            None => {
                tracing::warn!("every CSS minifier failed, keeping original CSS");
                css.to_string()
            }
        }
    }
}

/// Run one step, then the fix-ups, and check that no placeholder was lost.
///
/// Panics from third-party engines are caught and treated as failures.
fn attempt(
    name: &str,
    css: &str,
    expected: usize,
    options: &CssOptions,
    step: impl FnOnce() -> Result<String, CssBackendError>,
) -> Option<String> {
    let result = match catch_unwind(AssertUnwindSafe(step)) {
        Ok(result) => result,
        Err(payload) => Err(CssBackendError::Panicked(panic_message(payload.as_ref()))),
    };

    let checked = result.and_then(|minified| {
        let processed = post_process(&minified, css, options);
        let found = count_placeholders(&processed);
        if found == expected {
            Ok(processed)
        } else {
            Err(CssBackendError::LostPlaceholders { expected, found })
        }
    });

    match checked {
        Ok(minified) => Some(minified),
        Err(e) => {
            tracing::warn!("{} CSS minification failed: {}", name, e);
            None
        }
    }
}

/// Fix-ups applied after whichever step succeeded
pub fn post_process(minified: &str, original: &str, options: &CssOptions) -> String {
    let mut result = minified.to_string();

    if options.fix_pseudo_class_spaces {
        result = fix_pseudo_class_spaces(original, &result);
    }

    if options.preserve_template_expressions {
        result = fix_template_expressions(&result);
        result = fix_statement_semicolons(original, &result);
    }

    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
