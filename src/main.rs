//! Expense Chat - conversational expense tracker
//!
//! Free-text messages are classified by a hosted language model into new
//! expenses or questions about spending; expenses land in a ledger and a
//! dashboard summarises them.

mod api;
mod classifier;
mod config;
mod dashboard;
mod ledger;
mod llm;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use classifier::LlmClassifier;
use config::{AppConfig, LlmConfig};
use ledger::LedgerBackend;
use llm::{GeminiService, LoggingService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expense_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;

    // Open the ledger
    let ledger = LedgerBackend::open(&config.ledger_path)?;
    tracing::info!(
        path = %config.ledger_path.display(),
        backend = ledger.kind(),
        "Opened ledger"
    );

    let classifier = build_classifier(&config.llm);

    let state = AppState::new(ledger, classifier, &config);
    if !state.requires_password() {
        tracing::warn!("APP_PASSWORD is not set; the app is open to anyone who can reach it.");
    }

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Expense chat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_classifier(config: &LlmConfig) -> LlmClassifier {
    if !config.is_configured() {
        tracing::warn!("No language model configured. Set GOOGLE_API_KEY or LLM_GATEWAY.");
        return LlmClassifier::unconfigured();
    }

    let service = GeminiService::new(
        config.api_key.clone().unwrap_or_default(),
        &config.model,
        config.gateway.as_deref(),
    );
    match service {
        Ok(service) => {
            let classifier = LlmClassifier::new(Arc::new(LoggingService::new(Arc::new(service))));
            tracing::info!(
                model = classifier.model_id().unwrap_or_default(),
                gateway = config.gateway.is_some(),
                "Classifier initialized"
            );
            classifier
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create Gemini client");
            LlmClassifier::unconfigured()
        }
    }
}
