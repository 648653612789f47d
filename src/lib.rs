pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod quality_gate;
pub mod resolver;
pub mod sheet;
pub mod types;
