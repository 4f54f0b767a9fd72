use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Prediction request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Prediction service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid prediction response: {0}")]
    Decode(#[source] reqwest::Error),
}
