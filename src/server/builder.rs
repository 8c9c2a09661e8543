//! ServerBuilder for fluent API to build the HTTP server

use crate::config::LedgerConfig;
use crate::ledger::{LedgerStore, PaymentRecorder};
use crate::reports::ReportAggregator;
use crate::sequence::SequenceAllocator;
use crate::server::handlers::AppState;
use crate::server::router::build_routes;
use crate::storage::LedgerStorage;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder wiring storage and configuration into the ledger services and
/// their routes.
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_storage(InMemoryLedgerStorage::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    storage: Option<Arc<dyn LedgerStorage>>,
    config: LedgerConfig,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with the default configuration
    pub fn new() -> Self {
        Self {
            storage: None,
            config: LedgerConfig::default_config(),
        }
    }

    /// Set the storage backend (required)
    pub fn with_storage(mut self, storage: impl LedgerStorage + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the application state without the HTTP layer. Useful for tests
    /// and for embedding the services in another router.
    pub fn build_state(self) -> Result<AppState> {
        let storage = self
            .storage
            .ok_or_else(|| anyhow::anyhow!("storage is required. Call .with_storage()"))?;
        let config = Arc::new(self.config);

        let sequences = Arc::new(SequenceAllocator::new(
            Arc::clone(&storage),
            Arc::clone(&config),
        ));
        let ledger = Arc::new(LedgerStore::new(
            Arc::clone(&storage),
            Arc::clone(&sequences),
        ));
        let recorder = Arc::new(PaymentRecorder::new(
            Arc::clone(&storage),
            sequences,
            config,
        ));
        let reports = Arc::new(ReportAggregator::new(storage));

        Ok(AppState {
            ledger,
            recorder,
            reports,
        })
    }

    /// Build the axum router with tracing and CORS layers applied
    pub fn build(self) -> Result<Router> {
        let state = self.build_state()?;
        Ok(build_routes(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize the tracing subscriber from `RUST_LOG`, defaulting to info.
/// Call once at process start; safe to call again (subsequent calls are
/// no-ops).
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryLedgerStorage;

    #[test]
    fn test_build_requires_storage() {
        assert!(ServerBuilder::new().build().is_err());
    }

    #[test]
    fn test_build_with_storage() {
        let router = ServerBuilder::new()
            .with_storage(InMemoryLedgerStorage::new())
            .build();
        assert!(router.is_ok());
    }

    #[tokio::test]
    async fn test_build_state_shares_one_storage() {
        let state = ServerBuilder::new()
            .with_storage(InMemoryLedgerStorage::new())
            .build_state()
            .unwrap();

        let invoice = state
            .ledger
            .create_invoice(
                "prop-1",
                "2024-05",
                crate::core::Domain::Rent,
                rust_decimal_macros::dec!(100),
            )
            .await
            .unwrap();

        // The recorder and aggregator see the same store.
        state
            .recorder
            .record_payment(
                &invoice.id,
                rust_decimal_macros::dec!(40),
                crate::core::PaymentMethod::Cash,
            )
            .await
            .unwrap();
        let report = state
            .reports
            .generate_report(crate::core::ReportType::Rent, "2024-05", None)
            .await
            .unwrap();
        assert_eq!(report.data.total_collected, rust_decimal_macros::dec!(40));
    }
}
