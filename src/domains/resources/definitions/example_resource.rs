//! Example resource unit: a static configuration resource and a templated
//! user profile.

use rmcp::model::{RawResource, RawResourceTemplate};

use crate::core::handle::ServerHandle;
use crate::domains::resources::{ResourceError, ResourceReadResult, resource_fn};
use crate::loader::{ImportContext, Unit, UnitError};

pub const APP_CONFIG_URI: &str = "config://app";
pub const USER_PROFILE_TEMPLATE: &str = "users://{user_id}/profile";

pub struct ExampleResourcesUnit;

impl ExampleResourcesUnit {
    pub const ENTRY: &'static str = "example_resource";

    pub fn import(_ctx: &ImportContext<'_>) -> Result<Box<dyn Unit>, UnitError> {
        Ok(Box::new(Self))
    }
}

impl Unit for ExampleResourcesUnit {
    fn register(&self, handle: &mut ServerHandle) -> Result<(), UnitError> {
        let mut config = RawResource::new(APP_CONFIG_URI, "App Configuration");
        config.description = Some("Static configuration data".to_string());
        config.mime_type = Some("text/plain".to_string());
        handle.add_resource(
            config,
            resource_fn(|_uri, _params| async {
                Ok(ResourceReadResult::text("App configuration here"))
            }),
        )?;

        handle.add_resource_template(
            RawResourceTemplate {
                uri_template: USER_PROFILE_TEMPLATE.to_string(),
                name: "User Profile".to_string(),
                title: None,
                description: Some("Profile data for a given user".to_string()),
                mime_type: Some("text/plain".to_string()),
            },
            resource_fn(|_uri, params| async move {
                match params.get("user_id") {
                    Some(user_id) => Ok(ResourceReadResult::text(format!(
                        "Profile data for user {}",
                        user_id
                    ))),
                    None => Err(ResourceError::missing_parameter("user_id")),
                }
            }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use rmcp::model::ResourceContents;

    fn text_of(contents: &ResourceContents) -> &str {
        match contents {
            ResourceContents::TextResourceContents { text, .. } => text,
            other => panic!("expected text contents, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_example_resources() {
        let mut handle = ServerHandle::new(Config::default());
        ExampleResourcesUnit.register(&mut handle).unwrap();

        assert_eq!(handle.resources().len(), 1);
        assert_eq!(handle.resource_templates().len(), 1);

        let app = handle.read_resource(APP_CONFIG_URI).await.unwrap();
        assert_eq!(text_of(&app.contents[0]), "App configuration here");

        let profile = handle.read_resource("users://alice/profile").await.unwrap();
        assert_eq!(text_of(&profile.contents[0]), "Profile data for user alice");
    }
}
