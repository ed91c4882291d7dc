//! services/api/src/adapters/correction_llm.rs
//!
//! This module contains the adapter for the proofreading LLM.
//! It implements the `CorrectionService` port from the `core` crate.

use crate::adapters::openai_chat::single_turn;
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use text_review_core::ports::{CorrectionService, PortResult};

const PROOFREADER_INSTRUCTIONS: &str = "You are an English proofreader. \
Return ONLY the corrected sentence(s), no quotes, no extra text.";

/// An adapter that implements `CorrectionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCorrectionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCorrectionAdapter {
    /// Creates a new `OpenAiCorrectionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl CorrectionService for OpenAiCorrectionAdapter {
    /// An empty completion yields the input unchanged.
    async fn correct_text(&self, text: &str) -> PortResult<String> {
        let corrected =
            single_turn(&self.client, &self.model, PROOFREADER_INSTRUCTIONS, text).await?;
        Ok(corrected.unwrap_or_else(|| text.to_string()))
    }
}
