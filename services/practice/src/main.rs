//! Precedent practice HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, and the HTTP router, seeds the bootstrap
//! administrator when configured, then serves the API and the metrics
//! endpoint until shutdown.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use practice::app::{AppState, build_router};
use practice::auth::bootstrap::seed_platform_admin;
use practice::config::{self, PracticeConfig};
use practice::notify::LogNotifier;
use practice::observability;
use practice::store::{PracticeStore, memory::InMemoryStore, postgres::PostgresStore};
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PracticeConfig::from_env_or_yaml().context("practice config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: PracticeConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("precedent-practice");
    let state = build_state(&config).await?;
    if config.bootstrap.is_enabled() {
        seed_platform_admin(state.store.as_ref(), &config.bootstrap).await?;
    }
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state.clone());
    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        backend = state.store.backend_name(),
        "practice service listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: &PracticeConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn PracticeStore> = match config.storage {
        config::StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        config::StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(PostgresStore::connect(pg).await?)
        }
    };
    Ok(AppState {
        api_version: "v1".to_string(),
        store,
        notifier: Arc::new(LogNotifier),
    })
}
