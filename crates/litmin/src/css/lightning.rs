//! Primary CSS backend, via lightningcss.

use lightningcss::stylesheet::{
    MinifyOptions, ParserFlags, ParserOptions, PrinterOptions, StyleSheet,
};
use lightningcss::targets::{Browsers, Targets};

use super::CssBackend;
use crate::error::CssBackendError;
use crate::options::{BrowserTargets, CssOptions};

pub struct LightningCss;

impl CssBackend for LightningCss {
    fn name(&self) -> &'static str {
        "lightningcss"
    }

    fn minify(&self, css: &str, options: &CssOptions) -> Result<String, CssBackendError> {
        let mut flags = ParserFlags::empty();
        if options.nesting {
            flags |= ParserFlags::NESTING;
        }
        if options.custom_media {
            flags |= ParserFlags::CUSTOM_MEDIA;
        }

        let parser_options = ParserOptions {
            filename: "template.css".to_string(),
            flags,
            ..ParserOptions::default()
        };

        let mut stylesheet = StyleSheet::parse(css, parser_options)
            .map_err(|e| CssBackendError::Parse(e.to_string()))?;

        stylesheet
            .minify(MinifyOptions {
                targets: targets(&options.targets),
                ..MinifyOptions::default()
            })
            .map_err(|e| CssBackendError::Minify(e.to_string()))?;

        let printer_options = PrinterOptions {
            minify: true,
            targets: targets(&options.targets),
            ..PrinterOptions::default()
        };
        let result = stylesheet
            .to_css(printer_options)
            .map_err(|e| CssBackendError::Print(e.to_string()))?;

        Ok(result.code)
    }
}

/// Major versions, in lightningcss's packed `major << 16` form
fn targets(targets: &BrowserTargets) -> Targets {
    let version = |major: Option<u32>| major.map(|m| m << 16);

    Targets::from(Browsers {
        android: version(targets.android),
        chrome: version(targets.chrome),
        edge: version(targets.edge),
        firefox: version(targets.firefox),
        ie: version(targets.ie),
        ios_saf: version(targets.ios_saf),
        opera: version(targets.opera),
        safari: version(targets.safari),
        samsung: version(targets.samsung),
    })
}
