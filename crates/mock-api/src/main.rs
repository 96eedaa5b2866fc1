//! `campusmarket-mock-api` -- standalone mock backend.
//!
//! Serves the campusmarket CRUD endpoints from memory so the client (or a
//! frontend under development) has something to talk to without the real
//! backend.
//!
//! # Environment variables
//!
//! | Variable         | Required | Default | Description        |
//! |------------------|----------|---------|--------------------|
//! | `MOCK_API_PORT`  | no       | `4010`  | TCP port to bind   |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default TCP port for the standalone mock.
const DEFAULT_PORT: u16 = 4010;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campusmarket_mock_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("MOCK_API_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let listener = match tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(port, error = %e, "Failed to bind mock API port");
            std::process::exit(1);
        }
    };

    tracing::info!(port, "Mock API listening");

    if let Err(e) = campusmarket_mock_api::run(listener).await {
        tracing::error!(error = %e, "Mock API server failed");
        std::process::exit(1);
    }
}
