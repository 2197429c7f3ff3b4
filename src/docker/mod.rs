// Container runtime boundary — state model, runtime trait, docker CLI client.

pub mod cli;
pub mod engine;
pub mod error;
pub mod types;

pub use cli::CliRuntime;
pub use engine::{ContainerRuntime, invoking_user};
pub use error::RuntimeError;
pub use types::{ContainerHandle, ContainerState, ContainerStatus, LogStream, Mount, RunSpec};
