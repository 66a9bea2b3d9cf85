pub mod config;
pub mod models;
pub mod intelligence; // Static lab reference ranges
pub mod pipeline; // Clinical assistant: context, change detection, prompts

use tracing_subscriber::EnvFilter;

pub use pipeline::assistant::completion::{CompletionService, OpenAiClient};
pub use pipeline::assistant::orchestrator::{AnalysisReport, AssistantReply, ClinicalAssistant};
pub use pipeline::assistant::source::{ChatTurnSink, InMemoryRecordSource, PatientRecordSource};
pub use pipeline::assistant::AssistantError;

/// Install the global tracing subscriber for a host process.
///
/// `RUST_LOG` wins when set; otherwise [`config::default_log_filter`] applies.
/// Calling it again once a subscriber is installed has no effect.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} tracing initialized", config::APP_NAME, config::APP_VERSION);
    }
}
