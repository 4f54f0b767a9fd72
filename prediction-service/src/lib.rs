pub mod advisor;
pub mod models;
pub mod prompt;
pub mod service;

pub use advisor::{Advisor, AdvisorError, OpenRouterAdvisor};
pub use service::{AppState, create_app};
pub use models::*;
