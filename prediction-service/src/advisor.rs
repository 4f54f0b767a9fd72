use async_trait::async_trait;
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::Prompt,
    providers::openrouter,
};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

const PREAMBLE: &str =
    "You are a medical AI assistant giving practical, evidence-based self-care guidance.";

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("OPENROUTER_API_KEY not set")]
    MissingApiKey,

    #[error("LLM completion failed: {0}")]
    Completion(String),
}

/// Produces medical suggestions for a fully built prompt.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, prompt: &str) -> Result<String, AdvisorError>;
}

pub struct OpenRouterAdvisor {
    agent: Agent<openrouter::CompletionModel>,
}

impl OpenRouterAdvisor {
    pub fn new(api_key: &str, model: &str) -> Self {
        let client = openrouter::Client::new(api_key);
        let agent = client.agent(model).preamble(PREAMBLE).build();
        Self { agent }
    }

    /// Reads `OPENROUTER_API_KEY` and the optional `PREDICTION_MODEL`.
    pub fn from_env() -> Result<Self, AdvisorError> {
        let api_key =
            std::env::var("OPENROUTER_API_KEY").map_err(|_| AdvisorError::MissingApiKey)?;
        let model = std::env::var("PREDICTION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        info!("Using model {}", model);
        Ok(Self::new(&api_key, &model))
    }
}

#[async_trait]
impl Advisor for OpenRouterAdvisor {
    async fn advise(&self, prompt: &str) -> Result<String, AdvisorError> {
        self.agent
            .prompt(prompt.to_string())
            .await
            .map_err(|e| AdvisorError::Completion(e.to_string()))
    }
}
