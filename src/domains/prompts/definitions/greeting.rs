//! Greeting prompt unit.

use super::{PromptDefinition, PromptUnit};
use crate::loader::{ImportContext, Unit, UnitError};

pub struct GreetingPrompt;

impl PromptDefinition for GreetingPrompt {
    const NAME: &'static str = "greeting";
    const DESCRIPTION: &'static str = "A customizable greeting prompt";
    const TEMPLATE: &'static str = "Hello, {{name}}!{{#if style}} Please answer in a {{style}} tone.{{/if}}";
    const ARGUMENTS: &'static [(&'static str, &'static str, bool)] = &[
        ("name", "The name to greet", true),
        ("style", "The greeting style: formal, casual, or enthusiastic", false),
    ];
}

pub struct GreetingUnit;

impl GreetingUnit {
    pub const ENTRY: &'static str = "greeting";

    pub fn import(_ctx: &ImportContext<'_>) -> Result<Box<dyn Unit>, UnitError> {
        Ok(Box::new(PromptUnit::<GreetingPrompt>::new()))
    }
}
