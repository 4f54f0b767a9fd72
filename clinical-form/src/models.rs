use serde::{Deserialize, Serialize};

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub query: String,
}

/// Successful body returned by the prediction service. Extra fields such as
/// `status` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub response: String,
}
