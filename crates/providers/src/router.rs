//! Engine selection: builds the configured decision engine.

use jarvis_config::AppConfig;
use jarvis_core::engine::DecisionEngine;
use jarvis_core::error::EngineError;
use std::sync::Arc;
use tracing::info;

use crate::openai_compat::{GEMINI_BASE_URL, OPENAI_BASE_URL, OpenAiCompatEngine};

/// Build the decision engine named by `config.provider`.
///
/// `base_url` in the config overrides the provider's default endpoint; any
/// provider name other than the well-known ones requires it.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn DecisionEngine>, EngineError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            EngineError::NotConfigured(
                "no API key found; set GOOGLE_API_KEY (or JARVIS_API_KEY) or add api_key to the config file"
                    .into(),
            )
        })?;

    let base_url = match (&config.base_url, default_base_url(&config.provider)) {
        (Some(url), _) => url.clone(),
        (None, Some(url)) => url.to_string(),
        (None, None) => {
            return Err(EngineError::NotConfigured(format!(
                "provider '{}' needs a base_url",
                config.provider
            )));
        }
    };

    info!(provider = %config.provider, base_url = %base_url, model = %config.model, "Decision engine configured");
    let engine = OpenAiCompatEngine::new(&config.provider, base_url, api_key)?;
    Ok(Arc::new(engine))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" | "google" => Some(GEMINI_BASE_URL),
        "openai" => Some(OPENAI_BASE_URL),
        "ollama" => Some("http://localhost:11434/v1"),
        _ => None,
    }
}
