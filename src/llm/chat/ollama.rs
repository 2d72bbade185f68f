use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use async_trait::async_trait;
use std::time::Duration;
use super::{ ChatClient, CompletionResponse };
use crate::error::ChefError;
use crate::llm::{ LlmConfig, LlmType };
use log::info;

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

impl OllamaClient {
    pub fn new(
        base_url: Option<String>,
        completion_model: Option<String>,
        timeout: Duration
    ) -> Result<Self, ChefError> {
        let model = completion_model.unwrap_or_else(|| "llama3".to_string());
        let url = base_url.unwrap_or_else(|| "http://localhost:11434".into());
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChefError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            completion_model: model,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChefError> {
        if config.llm_type != LlmType::Ollama {
            return Err(ChefError::Config("Invalid config type for OllamaClient".into()));
        }

        Self::new(config.base_url.clone(), config.completion_model.clone(), config.timeout)
    }

    pub async fn generate(&self, prompt: &str) -> Result<GenerateResponse, ChefError> {
        let url = format!("{}/api/generate", self.base_url);
        let req = GenerateRequest {
            model: self.completion_model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };
        let resp = self.http.post(&url).json(&req).send().await?.error_for_status()?;
        let data = resp.json::<GenerateResponse>().await?;
        Ok(data)
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ChefError> {
        info!("OllamaClient::complete() → model={} base_url={}", self.completion_model, self.base_url);
        let resp = self.generate(prompt).await?;
        Ok(CompletionResponse { response: resp.response })
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
