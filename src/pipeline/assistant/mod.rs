pub mod types;
pub mod normalize;
pub mod render;
pub mod context;
pub mod changes;
pub mod window;
pub mod prompt;
pub mod turn;
pub mod analysis;
pub mod completion;
pub mod source;
pub mod locks;
pub mod orchestrator;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Record source failed: {0}")]
    RecordSource(String),

    /// The completion service was unreachable, timed out, or returned an error.
    #[error("Completion service failed: {0}")]
    UpstreamService(String),

    /// The completion service answered, but the answer is not the expected structure.
    #[error("Response does not match the analysis schema: {0}")]
    ResponseSchema(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
