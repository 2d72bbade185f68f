use async_trait::async_trait;
use log::{ error, info };
use std::time::Duration;

use super::{ ChatClient, CompletionResponse };
use crate::error::ChefError;
use crate::llm::LlmConfig;
use rllm::chat::{ ChatMessage, ChatRole, MessageType };
use rllm::builder::{ LLMBackend, LLMBuilder };
use rllm::LLMProvider;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

pub struct GeminiChatClient {
    llm: Box<dyn LLMProvider + Send + Sync>,
    model: String,
    base_url: Option<String>,
    timeout: Duration,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration
    ) -> Result<Self, ChefError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let mut builder = LLMBuilder::new()
            .backend(LLMBackend::Google)
            .api_key(api_key)
            .model(&chat_model)
            .stream(false);

        if let Some(url) = &base_url {
            builder = builder.base_url(url);
        }

        let llm_provider = builder
            .build()
            .map_err(|e| ChefError::Config(format!("Failed to build Gemini client: {}", e)))?;

        Ok(Self {
            llm: llm_provider,
            model: chat_model,
            base_url,
            timeout,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChefError> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| ChefError::Config("Gemini API key is required".to_string()))?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone(), config.timeout)
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ChefError> {
        let messages = vec![ChatMessage {
            role: ChatRole::User,
            content: prompt.to_string(),
            message_type: MessageType::Text,
        }];
        info!("GeminiChatClient::complete() → model={} base_url={:?}", self.model, self.base_url);

        let resp = tokio::time
            ::timeout(self.timeout, self.llm.chat(&messages)).await?
            .map_err(|e| {
                error!("Gemini completion failed: {}", e);
                ChefError::Upstream(format!("Gemini: {}", e))
            })?;
        let text = resp
            .text()
            .map(|s| s.to_string())
            .unwrap_or_else(|| resp.to_string());
        Ok(CompletionResponse { response: text })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        self.base_url.clone()
    }
}
