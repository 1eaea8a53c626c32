pub mod config;
pub mod paths;

pub use config::PipelineConfig;
pub use paths::OutputLayout;
