//! Prompt templates and their renderer.
//!
//! Template syntax:
//! - `{{name}}` is replaced by the argument's value, or nothing when absent
//! - `{{#if name}}...{{/if}}` keeps its body only when `name` is non-empty
//! - `{{#if name}}...{{else}}...{{/if}}` picks one branch
//!
//! Conditionals nest.

use std::collections::HashMap;

use rmcp::model::PromptArgument;

use super::error::PromptError;

/// A prompt that can be rendered with arguments.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<PromptArgument>,
    pub template: String,
}

impl PromptTemplate {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        arguments: Vec<PromptArgument>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            arguments,
            template: template.into(),
        }
    }

    /// Check the template syntax without rendering.
    pub fn validate(&self) -> Result<(), PromptError> {
        parse(&self.template).map(|_| ())
    }

    pub fn render(&self, arguments: &HashMap<String, String>) -> Result<String, PromptError> {
        let nodes = parse(&self.template)?;
        let mut out = String::with_capacity(self.template.len());
        render_nodes(&nodes, arguments, &mut out);
        Ok(out)
    }
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Text(&'a str),
    Var(&'a str),
    If(&'a str),
    Else,
    EndIf,
}

#[derive(Debug)]
enum Node {
    Text(String),
    Var(String),
    If {
        var: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

fn tokenize(src: &str) -> Result<Vec<Token<'_>>, PromptError> {
    let mut tokens = Vec::new();
    let mut rest = src;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            tokens.push(Token::Text(&rest[..open]));
        }
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or_else(|| PromptError::template(format!("Unclosed tag at '{}'", &rest[open..])))?;
        let tag = after[..close].trim();

        let token = if let Some(var) = tag.strip_prefix("#if ") {
            Token::If(var.trim())
        } else if tag == "else" {
            Token::Else
        } else if tag == "/if" {
            Token::EndIf
        } else if tag.is_empty() || tag.starts_with(['#', '/']) {
            return Err(PromptError::template(format!("Unknown tag '{{{{{}}}}}'", tag)));
        } else {
            Token::Var(tag)
        };
        tokens.push(token);
        rest = &after[close + 2..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest));
    }
    Ok(tokens)
}

fn parse(src: &str) -> Result<Vec<Node>, PromptError> {
    let tokens = tokenize(src)?;
    let mut iter = tokens.into_iter();
    let (nodes, end) = parse_block(&mut iter)?;
    match end {
        None => Ok(nodes),
        Some(Token::Else) => Err(PromptError::template("{{else}} outside of {{#if}}")),
        Some(_) => Err(PromptError::template("{{/if}} without matching {{#if}}")),
    }
}

/// Parse until `{{else}}`, `{{/if}}` or end of input, returning the stop token.
fn parse_block<'a>(
    tokens: &mut impl Iterator<Item = Token<'a>>,
) -> Result<(Vec<Node>, Option<Token<'a>>), PromptError> {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text.to_string())),
            Token::Var(name) => nodes.push(Node::Var(name.to_string())),
            Token::If(var) => {
                let (then, end) = parse_block(tokens)?;
                let otherwise = match end {
                    Some(Token::EndIf) => Vec::new(),
                    Some(Token::Else) => match parse_block(tokens)? {
                        (otherwise, Some(Token::EndIf)) => otherwise,
                        _ => return Err(missing_endif(var)),
                    },
                    _ => return Err(missing_endif(var)),
                };
                nodes.push(Node::If {
                    var: var.to_string(),
                    then,
                    otherwise,
                });
            }
            stop @ (Token::Else | Token::EndIf) => return Ok((nodes, Some(stop))),
        }
    }
    Ok((nodes, None))
}

fn missing_endif(var: &str) -> PromptError {
    PromptError::template(format!("Missing {{{{/if}}}} for {{{{#if {}}}}}", var))
}

fn render_nodes(nodes: &[Node], arguments: &HashMap<String, String>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(name) => {
                if let Some(value) = arguments.get(name) {
                    out.push_str(value);
                }
            }
            Node::If {
                var,
                then,
                otherwise,
            } => {
                let set = arguments.get(var).is_some_and(|v| !v.is_empty());
                render_nodes(if set { then } else { otherwise }, arguments, out);
            }
        }
    }
}

/// Builder for prompt templates.
pub struct PromptTemplateBuilder {
    name: String,
    description: Option<String>,
    arguments: Vec<PromptArgument>,
    template: String,
}

impl PromptTemplateBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            template: String::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required_arg(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.arg(name, description, true)
    }

    pub fn optional_arg(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.arg(name, description, false)
    }

    fn arg(mut self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.arguments.push(PromptArgument {
            name: name.into(),
            title: None,
            description: Some(description.into()),
            required: Some(required),
        });
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn build(self) -> PromptTemplate {
        PromptTemplate {
            name: self.name,
            description: self.description,
            arguments: self.arguments,
            template: self.template,
        }
    }
}
