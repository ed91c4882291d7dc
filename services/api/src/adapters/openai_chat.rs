//! services/api/src/adapters/openai_chat.rs
//!
//! The single-turn chat completion shared by the correction and translation adapters.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use text_review_core::ports::{PortError, PortResult};

/// Sends one system instruction plus one user message and returns the trimmed
/// text of the first choice, or `None` when the model replied with nothing.
pub async fn single_turn(
    client: &Client<OpenAIConfig>,
    model: &str,
    instructions: &str,
    input: &str,
) -> PortResult<Option<String>> {
    let messages = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(instructions)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(input)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
    ];

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .temperature(0.0)
        .n(1)
        .build()
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

    // Call the API and manually map the error if it occurs, which respects the orphan rule.
    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

    Ok(response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty()))
}
