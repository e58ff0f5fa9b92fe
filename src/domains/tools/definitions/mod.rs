//! Built-in tool units.

pub mod example;

pub use example::{CalculateBmiParams, CalculateBmiTool, ExampleToolsUnit};
