//! Prompt template rendering.
//!
//! Templates name context fields with `{field}` placeholders. A placeholder may
//! carry a read-time fallback, `{field|fallback}`, used when the field is
//! missing, null, or blank. `{{` and `}}` render as literal braces so templates
//! can show the model the JSON shape they expect.
//!
//! Rendering never fails: an unknown field renders as its fallback or as the
//! empty string, and a brace that does not open a well-formed placeholder is
//! copied through unchanged.

use serde_json::Value;

use crate::PipelineContext;

/// One `{field}` or `{field|fallback}` occurrence in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Context field the placeholder reads.
    pub name: &'a str,
    /// Text rendered when the field is missing or blank.
    pub fallback: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Field(Placeholder<'a>),
}

/// Renders `template` against `context`.
pub fn render(template: &str, context: &PipelineContext) -> String {
    let mut out = String::with_capacity(template.len());
    for segment in segments(template) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Field(placeholder) => {
                let value = context
                    .get(placeholder.name)
                    .map(display_value)
                    .filter(|text| !text.trim().is_empty());
                match value {
                    Some(text) => out.push_str(&text),
                    None => out.push_str(placeholder.fallback.unwrap_or_default()),
                }
            }
        }
    }
    out
}

/// Lists the placeholders of `template` in order of appearance.
pub fn placeholders(template: &str) -> Vec<Placeholder<'_>> {
    segments(template)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Field(placeholder) => Some(placeholder),
            Segment::Text(_) => None,
        })
        .collect()
}

/// Converts a context value to the text substituted into prompts and shown to
/// operators.
///
/// Strings are used verbatim, arrays are joined with `", "`, null is empty, and
/// every other value is rendered as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn segments(template: &str) -> Vec<Segment<'_>> {
    let bytes = template.as_bytes();
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                // Escaped brace: keep one, drop the other.
                out.push(Segment::Text(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'{' => match parse_placeholder(template, i) {
                Some((placeholder, end)) => {
                    if literal_start < i {
                        out.push(Segment::Text(&template[literal_start..i]));
                    }
                    out.push(Segment::Field(placeholder));
                    i = end;
                    literal_start = i;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    if literal_start < template.len() {
        out.push(Segment::Text(&template[literal_start..]));
    }
    out
}

/// Parses a placeholder whose `{` sits at `open`. Returns the placeholder and
/// the index just past its closing `}`.
fn parse_placeholder(template: &str, open: usize) -> Option<(Placeholder<'_>, usize)> {
    let bytes = template.as_bytes();
    let name_start = open + 1;
    let mut i = name_start;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name = &template[name_start..i];

    match bytes.get(i) {
        Some(b'}') => Some((Placeholder { name, fallback: None }, i + 1)),
        Some(b'|') => {
            let fallback_start = i + 1;
            let close = template[fallback_start..].find(['{', '}'])? + fallback_start;
            if bytes[close] != b'}' {
                return None;
            }
            let fallback = &template[fallback_start..close];
            Some((
                Placeholder {
                    name,
                    fallback: Some(fallback),
                },
                close + 1,
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> PipelineContext {
        let mut ctx = PipelineContext::default();
        if let Value::Object(map) = value {
            ctx.merge(map);
        }
        ctx
    }

    #[test]
    fn substitutes_named_fields() {
        let ctx = context(json!({"topic": "Rust", "tone_style": "friendly"}));
        assert_eq!(
            render("Topic: {topic}; tone: {tone_style}.", &ctx),
            "Topic: Rust; tone: friendly."
        );
    }

    #[test]
    fn missing_fields_render_empty_or_fallback() {
        let ctx = context(json!({"source_text": ""}));
        assert_eq!(render("[{absent}]", &ctx), "[]");
        assert_eq!(
            render("Source: {source_text|Not provided}", &ctx),
            "Source: Not provided"
        );
        assert_eq!(render("{level|simple}", &ctx), "simple");
    }

    #[test]
    fn present_values_win_over_fallback() {
        let ctx = context(json!({"complexity_level": "complex"}));
        assert_eq!(render("{complexity_level|simple}", &ctx), "complex");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let ctx = context(json!({"x": "1"}));
        let template = "{{\n  \"field\": \"{x}\"\n}}";
        assert_eq!(render(template, &ctx), "{\n  \"field\": \"1\"\n}");
        assert!(placeholders(template).iter().all(|p| p.name == "x"));
    }

    #[test]
    fn malformed_braces_are_copied_through() {
        let ctx = context(json!({"x": "1"}));
        assert_eq!(render("a { b } {x", &ctx), "a { b } {x");
        assert_eq!(render("{not valid}", &ctx), "{not valid}");
    }

    #[test]
    fn non_string_values_are_flattened() {
        let ctx = context(json!({
            "list": ["aiogram", "requests", ""],
            "flag": true,
            "nested": {"a": 1}
        }));
        assert_eq!(render("{list}", &ctx), "aiogram, requests");
        assert_eq!(render("{flag}", &ctx), "true");
        assert_eq!(render("{nested}", &ctx), "{\"a\":1}");
    }

    #[test]
    fn placeholders_are_listed_in_order() {
        let found = placeholders("{a} and {b|x} then {{c}}");
        assert_eq!(
            found,
            vec![
                Placeholder {
                    name: "a",
                    fallback: None
                },
                Placeholder {
                    name: "b",
                    fallback: Some("x")
                },
            ]
        );
    }

    #[test]
    fn unicode_text_around_placeholders_is_preserved() {
        let ctx = context(json!({"topic": "ИИ в медицине"}));
        assert_eq!(render("Тема: {topic} ✅", &ctx), "Тема: ИИ в медицине ✅");
    }
}
