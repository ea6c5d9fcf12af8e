//! Tagged template literal location using OXC
//!
//! Only tagged template expressions are consumed from the AST. Each match is
//! recorded as the raw static parts (with byte offsets into the source) and
//! the spans of the expressions between them.

use std::ops::Range;

use oxc::allocator::Allocator;
use oxc::ast::ast::{Expression, TaggedTemplateExpression, TemplateElement};
use oxc::ast_visit::{Visit, walk};
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType};

use crate::{Error, Result};

/// What a template's static text contains, decided by its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Html,
    Css,
}

/// One static segment of a template literal, as raw source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePart {
    pub text: String,
    /// Byte offset of the first character in the source
    pub start: usize,
    /// Byte offset one past the last character in the source
    pub end: usize,
}

impl TemplatePart {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// A located tagged template.
///
/// `expressions.len() == parts.len() - 1`: expression `i` sits between part
/// `i` and part `i + 1`.
#[derive(Debug, Clone)]
pub struct Template {
    pub kind: TemplateKind,
    /// The matched tag name (`html` for both `html` and `lit.html`)
    pub tag: String,
    /// Span of the whole tagged expression, tag included
    pub span: Range<usize>,
    pub parts: Vec<TemplatePart>,
    pub expressions: Vec<Range<usize>>,
}

/// The tag names to look for, split by template kind.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    html: Vec<String>,
    css: Vec<String>,
}

impl TagSet {
    pub fn new(html: Vec<String>, css: Vec<String>) -> Self {
        Self { html, css }
    }

    /// The kind of template a tag designates. HTML wins if a name is in both sets.
    pub fn kind_of(&self, tag: &str) -> Option<TemplateKind> {
        if self.html.iter().any(|t| t == tag) {
            Some(TemplateKind::Html)
        } else if self.css.iter().any(|t| t == tag) {
            Some(TemplateKind::Css)
        } else {
            None
        }
    }
}

/// Templates collected by one parse, yielded in source order.
///
/// The whole file is parsed and visited before the first item is returned.
#[derive(Debug)]
pub struct Templates {
    inner: std::vec::IntoIter<Template>,
}

impl Iterator for Templates {
    type Item = Template;

    fn next(&mut self) -> Option<Template> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Templates {}

/// Pick a parser configuration from a file name, defaulting to an ES module.
pub fn source_type_for(file: &str) -> SourceType {
    SourceType::from_path(file).unwrap_or_else(|_| SourceType::mjs())
}

/// Locate every template in `source` whose tag is in `tags`.
///
/// `file` is only used to pick the source type and label errors. Any parse
/// error is fatal: the locator never guesses at malformed input.
pub fn locate(source: &str, file: &str, tags: &TagSet) -> Result<Templates> {
    let allocator = Allocator::default();
    let parser_result = Parser::new(&allocator, source, source_type_for(file)).parse();

    if parser_result.panicked || !parser_result.errors.is_empty() {
        let message = parser_result
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "parser panicked".to_string());
        return Err(Error::Parse {
            file: file.to_string(),
            message,
        });
    }

    let mut collector = TemplateCollector {
        source,
        tags,
        templates: Vec::new(),
        error: None,
    };
    collector.visit_program(&parser_result.program);

    if let Some((offset, message)) = collector.error {
        return Err(Error::MalformedTemplate {
            file: file.to_string(),
            offset,
            message,
        });
    }

    let mut templates = collector.templates;
    templates.sort_by_key(|t| t.span.start);
    tracing::trace!("{}: located {} template(s)", file, templates.len());

    Ok(Templates {
        inner: templates.into_iter(),
    })
}

/// Visitor that records matching tagged templates, nested ones included
struct TemplateCollector<'s> {
    source: &'s str,
    tags: &'s TagSet,
    templates: Vec<Template>,
    /// First structural problem found (offset, message)
    error: Option<(usize, String)>,
}

impl<'s> TemplateCollector<'s> {
    fn collect(&mut self, expr: &TaggedTemplateExpression<'_>, kind: TemplateKind, tag: &str) {
        let quasi = &expr.quasi;

        let mut parts = Vec::with_capacity(quasi.quasis.len());
        for element in &quasi.quasis {
            match part_range(self.source, element) {
                Some(range) => {
                    let text = self.source[range.clone()].to_string();
                    parts.push(TemplatePart::new(text, range.start, range.end));
                }
                None => {
                    self.error.get_or_insert((
                        element.span.start as usize,
                        "template part span does not match its raw text".to_string(),
                    ));
                    return;
                }
            }
        }

        let expressions: Vec<Range<usize>> = quasi
            .expressions
            .iter()
            .map(|e| {
                let span = e.span();
                span.start as usize..span.end as usize
            })
            .collect();

        if expressions.len() + 1 != parts.len() {
            self.error.get_or_insert((
                quasi.span.start as usize,
                format!(
                    "{} parts around {} expressions",
                    parts.len(),
                    expressions.len()
                ),
            ));
            return;
        }

        self.templates.push(Template {
            kind,
            tag: tag.to_string(),
            span: expr.span.start as usize..expr.span.end as usize,
            parts,
            expressions,
        });
    }
}

impl<'a> Visit<'a> for TemplateCollector<'_> {
    fn visit_tagged_template_expression(&mut self, expr: &TaggedTemplateExpression<'a>) {
        if let Some(name) = tag_name(&expr.tag)
            && let Some(kind) = self.tags.kind_of(name)
        {
            self.collect(expr, kind, name);
        }

        // Expressions may hold nested templates
        walk::walk_tagged_template_expression(self, expr);
    }
}

/// `html` for `html\`\`` and `lit.html\`\``; other tag shapes never match
fn tag_name<'b>(tag: &'b Expression<'_>) -> Option<&'b str> {
    match tag {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        Expression::StaticMemberExpression(member) => Some(member.property.name.as_str()),
        _ => None,
    }
}

/// Byte range of a template element's raw text.
///
/// The element span normally covers the raw text exactly; when it also covers
/// the surrounding `` ` ``, `}` or `${` delimiters they are trimmed off.
fn part_range(source: &str, element: &TemplateElement<'_>) -> Option<Range<usize>> {
    let raw = element.value.raw.as_str();
    let (mut start, mut end) = (element.span.start as usize, element.span.end as usize);
    let slice = source.get(start..end)?;
    if slice == raw {
        return Some(start..end);
    }

    if slice.starts_with('`') || slice.starts_with('}') {
        start += 1;
    }
    if slice.ends_with("${") {
        end -= 2;
    } else if slice.ends_with('`') {
        end -= 1;
    }

    (start <= end && source.get(start..end)? == raw).then_some(start..end)
}
