//! Example tool unit.
//!
//! Registers `calculate_bmi`. When the descriptor sets `cache_ttl_secs`, the
//! tool's results are memoized for that long.

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::core::cache::TtlCache;
use crate::core::handle::ServerHandle;
use crate::domains::tools::{CachedTool, ToolError, tool_model, typed_handler};
use crate::loader::{ImportContext, Unit, UnitError};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the BMI tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CalculateBmiParams {
    /// Body weight in kilograms.
    pub weight_kg: f64,

    /// Height in meters.
    pub height_m: f64,
}

// ============================================================================
// Tool Definition
// ============================================================================

pub struct CalculateBmiTool;

impl CalculateBmiTool {
    pub const NAME: &'static str = "calculate_bmi";

    pub const DESCRIPTION: &'static str = "Calculate BMI given weight in kg and height in meters";

    #[instrument(skip_all, fields(weight_kg = params.weight_kg, height_m = params.height_m))]
    pub fn execute(params: &CalculateBmiParams) -> Result<f64, ToolError> {
        if !(params.weight_kg.is_finite() && params.weight_kg > 0.0) {
            return Err(ToolError::invalid_arguments("weight_kg must be a positive number"));
        }
        if !(params.height_m.is_finite() && params.height_m > 0.0) {
            return Err(ToolError::invalid_arguments("height_m must be a positive number"));
        }
        Ok(params.weight_kg / (params.height_m * params.height_m))
    }
}

// ============================================================================
// Unit
// ============================================================================

/// Cache settings read from the descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheSettings {
    ttl: Duration,
    capacity: usize,
}

const DEFAULT_CACHE_CAPACITY: usize = 100;

pub struct ExampleToolsUnit {
    cache: Option<CacheSettings>,
}

impl ExampleToolsUnit {
    pub const ENTRY: &'static str = "example";

    pub fn import(ctx: &ImportContext<'_>) -> Result<Box<dyn Unit>, UnitError> {
        let ttl = ctx.setting::<u64>("cache_ttl_secs")?;
        let capacity = ctx.setting::<usize>("cache_capacity")?;

        let cache = match ttl {
            Some(0) => return Err(UnitError::invalid_setting("cache_ttl_secs", "must be positive")),
            Some(secs) => Some(CacheSettings {
                ttl: Duration::from_secs(secs),
                capacity: capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
            }),
            None => None,
        };

        Ok(Box::new(Self { cache }))
    }
}

impl Unit for ExampleToolsUnit {
    fn register(&self, handle: &mut ServerHandle) -> Result<(), UnitError> {
        let tool = tool_model::<CalculateBmiParams>(
            CalculateBmiTool::NAME,
            CalculateBmiTool::DESCRIPTION,
        );
        let handler =
            typed_handler(|p: CalculateBmiParams| async move { CalculateBmiTool::execute(&p) });

        match self.cache {
            Some(settings) => {
                info!(
                    ttl_secs = settings.ttl.as_secs(),
                    capacity = settings.capacity,
                    "Caching {} results",
                    CalculateBmiTool::NAME
                );
                let cache = Arc::new(TtlCache::new(settings.capacity, settings.ttl));
                handle.add_tool(tool, CachedTool::new(handler, cache))?;
            }
            None => handle.add_tool(tool, handler)?,
        }
        Ok(())
    }
}
