//! URL path templates with `{name}` placeholders.
//!
//! `{{` and `}}` stand for literal braces. Templates are parsed once, when
//! an endpoint is declared, so malformed templates fail early and the
//! per-call work is a single pass over pre-split segments.

use std::fmt;
use std::str::FromStr;

use crate::args::{render_value, Args};
use crate::error::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    placeholders: Vec<String>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let malformed = |position| TemplateError::Malformed {
            template: source.to_string(),
            position,
        };

        let mut segments = Vec::new();
        let mut placeholders: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, ch)) if ch.is_ascii_alphanumeric() || ch == '_' => {
                                name.push(ch)
                            }
                            _ => return Err(malformed(position)),
                        }
                    }
                    if name.is_empty() {
                        return Err(malformed(position));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    if !placeholders.contains(&name) {
                        placeholders.push(name.clone());
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(malformed(position)),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
            placeholders,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders.iter().any(|p| p == name)
    }

    /// Substitute every placeholder from `values`.
    ///
    /// Fails on the first placeholder (in template order) that has no value.
    /// Values are inserted as-is, without percent-encoding.
    pub fn render(&self, values: &Args) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingPlaceholder(name.clone()))?;
                    out.push_str(&render_value(value));
                }
            }
        }
        Ok(out)
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn plain_template_has_no_placeholders() {
        let template = Template::parse("a/b").unwrap();
        assert!(template.placeholders().is_empty());
        assert_eq!(template.render(&Args::new()).unwrap(), "a/b");
    }

    #[test]
    fn placeholders_are_listed_once_in_order() {
        let template = Template::parse("{b}/x/{a}/{b}").unwrap();
        assert_eq!(template.placeholders(), ["b", "a"]);
        assert!(template.has_placeholder("a"));
        assert!(!template.has_placeholder("x"));
    }

    #[test]
    fn renders_values_without_quoting() {
        let template = Template::parse("posts/{id}/comments/{slug}").unwrap();
        let rendered = template.render(&args! { "id" => 5, "slug" => "first" }).unwrap();
        assert_eq!(rendered, "posts/5/comments/first");
    }

    #[test]
    fn missing_value_names_first_missing_placeholder() {
        let template = Template::parse("{a}/{b}").unwrap();
        let err = template.render(&args! { "b" => 1 }).unwrap_err();
        assert_eq!(err, TemplateError::MissingPlaceholder("a".to_string()));
    }

    #[test]
    fn doubled_braces_are_literals() {
        let template = Template::parse("raw/{{x}}/{id}").unwrap();
        assert_eq!(template.placeholders(), ["id"]);
        assert_eq!(template.render(&args! { "id" => 1 }).unwrap(), "raw/{x}/1");
    }

    #[test]
    fn malformed_templates_are_rejected() {
        for source in ["posts/{id", "posts/}", "posts/{}", "posts/{a b}", "{a{b}}"] {
            let err = Template::parse(source).unwrap_err();
            assert!(
                matches!(err, TemplateError::Malformed { .. }),
                "{source}: {err:?}"
            );
        }
    }

    #[test]
    fn malformed_reports_position_of_opening_brace() {
        let err = Template::parse("posts/{}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Malformed {
                template: "posts/{}".to_string(),
                position: 6
            }
        );
    }
}
