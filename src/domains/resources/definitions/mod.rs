//! Built-in resource units.

pub mod example_resource;
pub mod server_info;

pub use example_resource::ExampleResourcesUnit;
pub use server_info::ServerInfoUnit;
