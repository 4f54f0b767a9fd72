use prediction_service::{OpenRouterAdvisor, create_app};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let advisor = match OpenRouterAdvisor::from_env() {
        Ok(advisor) => advisor,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "5000".to_string())
        .parse::<u16>()
        .unwrap_or(5000);

    let app = create_app(Arc::new(advisor));
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;

    info!("Clinical Prediction Service starting on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Prediction endpoint: POST http://{}/predict", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
