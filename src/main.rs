//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, "info"
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let shutdown = CancellationToken::new();
    let sweeper = app_state
        .production_service
        .sessions()
        .start_sweeper(config.sweep_interval(), shutdown.clone());

    let session_routes = Router::new()
        .route("/", post(handlers::production::open_session))
        .route(
            "/{session_id}",
            get(handlers::production::get_session).delete(handlers::production::close_session),
        )
        .route("/{session_id}/products", get(handlers::production::list_products))
        .route("/{session_id}/bom", post(handlers::production::compute_bom))
        .route("/{session_id}/work-orders", post(handlers::production::create_work_order));

    let work_order_routes = Router::new()
        .route("/", get(handlers::production::list_work_orders))
        .route("/{work_order_id}", get(handlers::production::get_work_order));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/production/sessions", session_routes)
        .nest("/api/production/work-orders", work_order_routes)
        .with_state(app_state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Falha ao escutar o sinal de desligamento: {}", e);
            }
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    sweeper.await?;
    tracing::info!("Servidor encerrado");

    Ok(())
}
