//! services/api/src/adapters/translation_llm.rs
//!
//! This module contains the adapter for the English-to-Vietnamese translation LLM.
//! It implements the `TranslationService` port from the `core` crate.

use crate::adapters::openai_chat::single_turn;
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use text_review_core::ports::{PortResult, TranslationService};

const TRANSLATOR_INSTRUCTIONS: &str = "Bạn là dịch giả chuyên nghiệp. Hãy dịch sang tiếng Việt. \
Chỉ trả về bản dịch, không kèm giải thích hay ký hiệu trích dẫn.";

/// An adapter that implements `TranslationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiTranslationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTranslationAdapter {
    /// Creates a new `OpenAiTranslationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl TranslationService for OpenAiTranslationAdapter {
    async fn translate_to_vietnamese(&self, text: &str) -> PortResult<Option<String>> {
        single_turn(&self.client, &self.model, TRANSLATOR_INSTRUCTIONS, text).await
    }
}
