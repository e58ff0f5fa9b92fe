//! URI templates for parameterized resources.
//!
//! Supports simple `{name}` variables, e.g. `users://{user_id}/profile`. A
//! variable matches one or more characters up to the next `/` or literal.

use std::collections::HashMap;

use super::error::ResourceError;

/// Variables captured from a URI, keyed by name.
pub type UriParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Var(String),
}

/// A parsed URI template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    raw: String,
    parts: Vec<Part>,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, ResourceError> {
        let mut parts = Vec::new();
        let mut rest = template;

        while !rest.is_empty() {
            match rest.find(['{', '}']) {
                None => {
                    parts.push(Part::Literal(rest.to_string()));
                    break;
                }
                Some(i) if rest[i..].starts_with('}') => {
                    return Err(ResourceError::invalid_uri("unmatched '}'"));
                }
                Some(i) => {
                    if i > 0 {
                        parts.push(Part::Literal(rest[..i].to_string()));
                    }
                    let after = &rest[i + 1..];
                    let end = after
                        .find('}')
                        .ok_or_else(|| ResourceError::invalid_uri("unclosed '{'"))?;
                    let name = &after[..end];
                    validate_name(name)?;
                    if matches!(parts.last(), Some(Part::Var(_))) {
                        return Err(ResourceError::invalid_uri(
                            "adjacent variables need a literal between them",
                        ));
                    }
                    if parts.iter().any(|p| matches!(p, Part::Var(v) if v == name)) {
                        return Err(ResourceError::invalid_uri(format!(
                            "variable '{}' appears twice",
                            name
                        )));
                    }
                    parts.push(Part::Var(name.to_string()));
                    rest = &after[end + 1..];
                }
            }
        }

        Ok(Self {
            raw: template.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Variable names in order of appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            Part::Var(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Match `uri` against the template, capturing its variables.
    pub fn matches(&self, uri: &str) -> Option<UriParams> {
        let mut params = UriParams::new();
        let mut rest = uri;

        for (i, part) in self.parts.iter().enumerate() {
            match part {
                Part::Literal(lit) => {
                    rest = rest.strip_prefix(lit.as_str())?;
                }
                Part::Var(name) => {
                    let end = match self.parts.get(i + 1) {
                        Some(Part::Literal(next)) => rest.find(next.as_str())?,
                        _ => rest.len(),
                    };
                    let value = &rest[..end];
                    if value.is_empty() || value.contains('/') {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(params)
    }
}

fn validate_name(name: &str) -> Result<(), ResourceError> {
    if name.is_empty() {
        return Err(ResourceError::invalid_uri("empty variable name"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ResourceError::invalid_uri(format!(
            "invalid variable name '{}'",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_single_variable() {
        let template = UriTemplate::parse("users://{user_id}/profile").unwrap();
        let params = template.matches("users://42/profile").unwrap();
        assert_eq!(params.get("user_id").map(String::as_str), Some("42"));
        assert_eq!(template.variables().collect::<Vec<_>>(), vec!["user_id"]);
    }

    #[test]
    fn test_match_trailing_variable() {
        let template = UriTemplate::parse("docs://{section}").unwrap();
        assert_eq!(
            template.matches("docs://intro").unwrap().get("section").cloned(),
            Some("intro".to_string())
        );
        assert!(template.matches("docs://intro/more").is_none());
    }

    #[test]
    fn test_no_match() {
        let template = UriTemplate::parse("users://{user_id}/profile").unwrap();
        assert!(template.matches("users://42/settings").is_none());
        assert!(template.matches("users:///profile").is_none());
        assert!(template.matches("users://4/2/profile").is_none());
        assert!(template.matches("config://app").is_none());
    }

    #[test]
    fn test_two_variables() {
        let template = UriTemplate::parse("repo://{owner}/{name}").unwrap();
        let params = template.matches("repo://acme/widgets").unwrap();
        assert_eq!(params.get("owner").map(String::as_str), Some("acme"));
        assert_eq!(params.get("name").map(String::as_str), Some("widgets"));
    }

    #[test]
    fn test_literal_only_template() {
        let template = UriTemplate::parse("config://app").unwrap();
        assert!(template.matches("config://app").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "users://{user_id/profile",
            "users://user_id}/profile",
            "users://{}/profile",
            "users://{a}{b}",
            "users://{a}/{a}",
            "users://{user-id}",
        ] {
            assert!(UriTemplate::parse(bad).is_err(), "{} should be rejected", bad);
        }
    }
}
