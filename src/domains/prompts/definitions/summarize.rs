//! Summarize prompt unit.

use super::{PromptDefinition, PromptUnit};
use crate::loader::{ImportContext, Unit, UnitError};

pub struct SummarizePrompt;

impl PromptDefinition for SummarizePrompt {
    const NAME: &'static str = "summarize";
    const DESCRIPTION: &'static str = "Summarize text or content";
    const TEMPLATE: &'static str = "Please summarize the following content{{#if length}} ({{length}} summary){{/if}}:\n\n{{content}}";
    const ARGUMENTS: &'static [(&'static str, &'static str, bool)] = &[
        ("content", "The content to summarize", true),
        ("length", "Desired length: brief, medium, or detailed", false),
    ];
}

pub struct SummarizeUnit;

impl SummarizeUnit {
    pub const ENTRY: &'static str = "summarize";

    pub fn import(_ctx: &ImportContext<'_>) -> Result<Box<dyn Unit>, UnitError> {
        Ok(Box::new(PromptUnit::<SummarizePrompt>::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::handle::ServerHandle;
    use crate::domains::prompts::PromptError;
    use std::collections::HashMap;

    #[test]
    fn test_summarize_registration() {
        let mut handle = ServerHandle::new(Config::default());
        PromptUnit::<SummarizePrompt>::new().register(&mut handle).unwrap();
        assert_eq!(handle.prompt_names(), vec!["summarize"]);

        assert!(matches!(
            handle.get_prompt("summarize", None),
            Err(PromptError::MissingArgument(_))
        ));

        let mut args = HashMap::new();
        args.insert("content".to_string(), "Rust is a language.".to_string());
        args.insert("length".to_string(), "brief".to_string());
        let result = handle.get_prompt("summarize", Some(args)).unwrap();
        assert_eq!(result.messages.len(), 1);
    }
}
