pub mod config;
pub mod entities;

pub use config::{Config, PipelineConfig};
pub use entities::*;
