//! Route template compilation.
//!
//! A template is a literal path with `{name}` placeholders, e.g.
//! `/orders/{id}/lines/{line}`. Each placeholder captures one or more
//! characters up to the next `/`, and the whole path must match.
//! Pre-built regular expressions are accepted as-is and yield positional
//! captures instead of named ones.

use crate::error::PatternError;
use regex::Regex;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

/// Capture used for every `{name}` placeholder.
const PLACEHOLDER_CAPTURE: &str = "([^/]+)";

/// Route as supplied at registration.
#[derive(Debug, Clone)]
pub enum RouteTemplate {
    /// Literal path with `{name}` placeholders.
    Template(String),
    /// Pre-built pattern, used verbatim.
    Pattern(Regex),
}

impl From<&str> for RouteTemplate {
    fn from(template: &str) -> Self {
        RouteTemplate::Template(template.to_string())
    }
}

impl From<String> for RouteTemplate {
    fn from(template: String) -> Self {
        RouteTemplate::Template(template)
    }
}

impl From<&String> for RouteTemplate {
    fn from(template: &String) -> Self {
        RouteTemplate::Template(template.clone())
    }
}

impl From<Regex> for RouteTemplate {
    fn from(pattern: Regex) -> Self {
        RouteTemplate::Pattern(pattern)
    }
}

/// Parameters extracted from a matched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteParams {
    /// Placeholder name to captured value, in declaration order.
    Named(Vec<(String, String)>),
    /// Capture groups of a raw pattern, in group order. Groups that did not
    /// participate in the match are `None`.
    Positional(Vec<Option<String>>),
}

impl RouteParams {
    /// Value of a named placeholder.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self {
            RouteParams::Named(pairs) => pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            RouteParams::Positional(_) => None,
        }
    }

    /// Value by position, for either form.
    pub fn get_index(&self, index: usize) -> Option<&str> {
        match self {
            RouteParams::Named(pairs) => pairs.get(index).map(|(_, value)| value.as_str()),
            RouteParams::Positional(values) => values.get(index).and_then(|v| v.as_deref()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RouteParams::Named(pairs) => pairs.len(),
            RouteParams::Positional(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON view: an object for named parameters, an array otherwise.
    ///
    /// Object keys follow `serde_json::Map` ordering, not declaration order.
    /// Serialize the params directly when declaration order matters.
    pub fn to_json(&self) -> Value {
        match self {
            RouteParams::Named(pairs) => Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            RouteParams::Positional(values) => Value::Array(
                values
                    .iter()
                    .map(|v| v.clone().map(Value::String).unwrap_or(Value::Null))
                    .collect(),
            ),
        }
    }
}

impl Serialize for RouteParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RouteParams::Named(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, value) in pairs {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            RouteParams::Positional(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}

/// Compiled route matcher. Cheap to clone; matching has no side effects.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Arc<Regex>,
    /// Placeholder names for templates, `None` for raw patterns.
    names: Option<Vec<String>>,
}

impl PathPattern {
    /// Compile a template or wrap a raw pattern.
    pub fn compile(template: impl Into<RouteTemplate>) -> Result<Self, PatternError> {
        match template.into() {
            RouteTemplate::Pattern(regex) => Ok(PathPattern {
                source: regex.as_str().to_string(),
                regex: Arc::new(regex),
                names: None,
            }),
            RouteTemplate::Template(template) => {
                let (expression, names) = template_to_regex(&template)?;
                let regex = Regex::new(&expression).map_err(|e| PatternError::Regex {
                    pattern: expression.clone(),
                    message: e.to_string(),
                })?;
                Ok(PathPattern {
                    source: template,
                    regex: Arc::new(regex),
                    names: Some(names),
                })
            }
        }
    }

    /// The template or pattern text this matcher was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholder_names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match a concrete path, returning its parameters.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let captures = self.regex.captures(path)?;

        Some(match &self.names {
            Some(names) => RouteParams::Named(
                names
                    .iter()
                    .enumerate()
                    .map(|(index, name)| {
                        let value = captures
                            .get(index + 1)
                            .map(|m| m.as_str().to_string())
                            .unwrap_or_default();
                        (name.clone(), value)
                    })
                    .collect(),
            ),
            None => RouteParams::Positional(
                captures
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()))
                    .collect(),
            ),
        })
    }
}

fn is_placeholder_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Translate a template into an anchored expression plus placeholder names.
fn template_to_regex(template: &str) -> Result<(String, Vec<String>), PatternError> {
    let mut expression = String::with_capacity(template.len() + 8);
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;

    expression.push('^');
    while let Some(open) = rest.find(&['{', '}'][..]) {
        if rest[open..].starts_with('}') {
            return Err(PatternError::UnbalancedBrace(template.to_string()));
        }
        expression.push_str(&regex::escape(&rest[..open]));

        let after_open = &rest[open + 1..];
        let close = after_open
            .find('}')
            .ok_or_else(|| PatternError::UnbalancedBrace(template.to_string()))?;
        let name = &after_open[..close];

        if name.is_empty() || !name.chars().all(is_placeholder_char) {
            return Err(PatternError::InvalidPlaceholder {
                template: template.to_string(),
                name: name.to_string(),
            });
        }
        if names.iter().any(|existing| existing == name) {
            return Err(PatternError::DuplicatePlaceholder {
                template: template.to_string(),
                name: name.to_string(),
            });
        }

        names.push(name.to_string());
        expression.push_str(PLACEHOLDER_CAPTURE);
        rest = &after_open[close + 1..];
    }
    expression.push_str(&regex::escape(rest));
    expression.push('$');

    Ok((expression, names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_extracts_named_params() {
        let pattern = PathPattern::compile("/orders/{id}").unwrap();
        let params = pattern.matches("/orders/42").unwrap();
        assert_eq!(params, RouteParams::Named(vec![("id".into(), "42".into())]));
        assert_eq!(params.get("id"), Some("42"));
        assert!(pattern.matches("/orders").is_none());
    }

    #[test]
    fn test_template_requires_full_match() {
        let pattern = PathPattern::compile("/orders/{id}").unwrap();
        assert!(pattern.matches("/orders/42/lines").is_none());
        assert!(pattern.matches("/api/orders/42").is_none());
        assert!(pattern.matches("/orders/").is_none());
    }

    #[test]
    fn test_multiple_placeholders_keep_declaration_order() {
        let pattern = PathPattern::compile("/tenants/{tenant}/orders/{order_id}").unwrap();
        let params = pattern.matches("/tenants/acme/orders/7").unwrap();
        assert_eq!(params.get_index(0), Some("acme"));
        assert_eq!(params.get_index(1), Some("7"));
        assert_eq!(
            params.to_json(),
            serde_json::json!({"tenant": "acme", "order_id": "7"})
        );
        assert_eq!(
            pattern.placeholder_names(),
            Some(&["tenant".to_string(), "order_id".to_string()][..])
        );
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let pattern = PathPattern::compile("/files/{name}.json?v=1").unwrap();
        assert!(pattern.matches("/files/report.json?v=1").is_some());
        assert!(pattern.matches("/files/reportxjson?v=1").is_none());
        assert!(pattern.matches("/files/report.jsonv=1").is_none());
    }

    #[test]
    fn test_placeholder_does_not_cross_separators() {
        let pattern = PathPattern::compile("/files/{name}").unwrap();
        assert!(pattern.matches("/files/a/b").is_none());
        assert_eq!(
            pattern.matches("/files/a.b-c_d").unwrap().get("name"),
            Some("a.b-c_d")
        );
    }

    #[test]
    fn test_template_without_placeholders() {
        let pattern = PathPattern::compile("/health").unwrap();
        let params = pattern.matches("/health").unwrap();
        assert!(params.is_empty());
        assert!(!pattern.is_match("/healthz"));
    }

    #[test]
    fn test_raw_pattern_yields_positional_params() {
        let pattern = PathPattern::compile(Regex::new(r"^/items/(\d+)(/detail)?$").unwrap()).unwrap();
        let params = pattern.matches("/items/12").unwrap();
        assert_eq!(
            params,
            RouteParams::Positional(vec![Some("12".into()), None])
        );
        assert_eq!(params.get_index(0), Some("12"));
        assert_eq!(params.get("anything"), None);
        assert_eq!(params.to_json(), serde_json::json!(["12", null]));
        assert!(pattern.matches("/items/abc").is_none());
        assert!(pattern.placeholder_names().is_none());
    }

    #[test]
    fn test_invalid_templates() {
        assert!(matches!(
            PathPattern::compile("/orders/{id"),
            Err(PatternError::UnbalancedBrace(_))
        ));
        assert!(matches!(
            PathPattern::compile("/orders/id}"),
            Err(PatternError::UnbalancedBrace(_))
        ));
        assert!(matches!(
            PathPattern::compile("/orders/{}"),
            Err(PatternError::InvalidPlaceholder { .. })
        ));
        assert!(matches!(
            PathPattern::compile("/orders/{a b}"),
            Err(PatternError::InvalidPlaceholder { .. })
        ));
        assert!(matches!(
            PathPattern::compile("/a/{id}/b/{id}"),
            Err(PatternError::DuplicatePlaceholder { .. })
        ));
    }

    #[test]
    fn test_params_serialize_in_declaration_order() {
        let params = RouteParams::Named(vec![
            ("z".into(), "1".into()),
            ("a".into(), "2".into()),
        ]);
        assert_eq!(serde_json::to_string(&params).unwrap(), r#"{"z":"1","a":"2"}"#);
        assert_eq!(params.to_json(), serde_json::json!({"a": "2", "z": "1"}));
        assert_eq!(params.to_json().get("z"), Some(&serde_json::json!("1")));
    }
}
