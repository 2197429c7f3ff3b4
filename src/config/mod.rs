pub mod loader;
pub mod types;

pub use loader::ConfigOverrides;
pub use types::OrchestratorConfig;
