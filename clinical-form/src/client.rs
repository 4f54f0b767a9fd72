use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::ClientError;
use crate::models::{PredictRequest, PredictResponse};

/// Where the prediction service listens when run locally.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/predict";

/// Anything that can turn a query into a response text.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, ClientError>;
}

/// JSON-over-HTTP client for the prediction service.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    http: Client,
    endpoint: String,
}

impl HttpPredictionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpPredictionClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, ClientError> {
        debug!(endpoint = %self.endpoint, "Sending prediction request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        response
            .json::<PredictResponse>()
            .await
            .map_err(ClientError::Decode)
    }
}
