//! Hosted-model integration for Dishscout.
//!
//! This crate exposes the [`traits::LlmClient`] interface, the grounding
//! metadata types that travel with a response, and the Gemini implementation.
//! [`build_client`] turns the loaded [`LlmSettings`] into a shared client.
//!
//! # Examples
//! ```no_run
//! use dishscout_config::LlmSettings;
//! use dishscout_llm::build_client;
//!
//! # #[tokio::main]
//! # async fn main() -> dishscout_common::Result<()> {
//! let client = build_client(&LlmSettings::default())?;
//! let answer = client.generate("Name one Thai dish.").await?;
//! println!("{}", answer.text);
//! # Ok(())
//! # }
//! ```
pub mod gemini;
pub mod grounding;
pub mod traits;

use dishscout_common::{DishError, Result};
use dishscout_config::{LlmProvider, LlmSettings};
use gemini::GeminiClient;
use std::sync::Arc;
use std::time::Duration;
use traits::LlmClient;

/// Build the process-wide model client from configuration.
///
/// Fails with [`DishError::Config`] when no usable API key is available.
pub fn build_client(settings: &LlmSettings) -> Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match settings.provider {
        LlmProvider::Gemini => {
            let api_key = settings.api_key().ok_or_else(|| {
                DishError::Config(
                    "No Gemini API key configured. Set GEMINI_API_KEY or llm.api_key.".to_string(),
                )
            })?;
            let client = GeminiClient::new(api_key, settings.model.clone())?
                .with_endpoint(settings.endpoint.clone())
                .with_timeout(Duration::from_secs(settings.timeout_secs))
                .with_maps_grounding(settings.maps_grounding);
            tracing::info!(
                model = %settings.model,
                timeout_secs = settings.timeout_secs,
                maps_grounding = settings.maps_grounding,
                "Gemini client ready"
            );
            Ok(Arc::new(client))
        }
    }
}
