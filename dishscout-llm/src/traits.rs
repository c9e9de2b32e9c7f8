use crate::grounding::GroundingMetadata;
use async_trait::async_trait;
use dishscout_common::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` to the model and wait for the complete answer.
    ///
    /// Implementations make exactly one outbound call and never retry; the
    /// caller decides what a failure means to the user.
    async fn generate(&self, prompt: &str) -> Result<LlmResponse>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
