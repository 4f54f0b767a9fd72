pub mod client;
pub mod commands;
pub mod error;
pub mod form;
pub mod models;
pub mod render;
pub mod submitter;

pub use client::{DEFAULT_ENDPOINT, HttpPredictionClient, PredictionClient};
pub use error::ClientError;
pub use form::{ClinicalForm, FileSlot, FormState, RESPONSE_PLACEHOLDER, SelectedFile, WeakForm};
pub use models::{PredictRequest, PredictResponse};
pub use submitter::{EMPTY_QUERY_MESSAGE, QuerySubmitter, REQUEST_FAILED_MESSAGE, Submission};
