//! Built-in prompt units.
//!
//! A prompt unit implements [`PromptDefinition`]; the blanket [`Unit`] impl
//! registers its template when the unit is loaded.

pub mod greeting;
pub mod summarize;

pub use greeting::{GreetingPrompt, GreetingUnit};
pub use summarize::{SummarizePrompt, SummarizeUnit};

use super::templates::{PromptTemplate, PromptTemplateBuilder};
use crate::core::handle::ServerHandle;
use crate::loader::{Unit, UnitError};

/// Static description of a prompt.
pub trait PromptDefinition {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    /// Template text in `{{variable}}` syntax.
    const TEMPLATE: &'static str;

    /// `(name, description, required)` for each argument.
    const ARGUMENTS: &'static [(&'static str, &'static str, bool)];

    fn build_template() -> PromptTemplate {
        Self::ARGUMENTS
            .iter()
            .fold(
                PromptTemplateBuilder::new(Self::NAME).description(Self::DESCRIPTION),
                |builder, (name, description, required)| {
                    if *required {
                        builder.required_arg(*name, *description)
                    } else {
                        builder.optional_arg(*name, *description)
                    }
                },
            )
            .template(Self::TEMPLATE)
            .build()
    }
}

/// Unit wrapper that registers a [`PromptDefinition`].
pub struct PromptUnit<P>(std::marker::PhantomData<P>);

impl<P> PromptUnit<P> {
    pub fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<P> Default for PromptUnit<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PromptDefinition> Unit for PromptUnit<P> {
    fn register(&self, handle: &mut ServerHandle) -> Result<(), UnitError> {
        handle.add_prompt(P::build_template())?;
        Ok(())
    }
}
