pub mod config;
pub mod knowledge; // Reference ranges + remedy knowledge base
pub mod models;
pub mod pipeline; // Parser, analyzer, orchestrator, OCR fallback
pub mod prediction; // Risk-model collaborators
pub mod remedy_chat; // Traditional-remedy chatbot

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Logs go to stderr so stdout stays
/// free for JSON output. Calling it twice is harmless.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
