use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use models::TodoRecord;
use service::{
    storage::{JsonMapStore, StoreLimits},
    todo::{Tenancy, TodoService},
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::ServerAuthConfig;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the durable store described by `cfg` and wrap it in the todo service
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    common::env::ensure_data_dir(&cfg.storage.data_file).await?;

    let limits = StoreLimits {
        max_key_len: cfg.storage.max_key_len,
        max_value_len: cfg.storage.max_value_len,
    };
    let store = JsonMapStore::<TodoRecord>::new(&cfg.storage.data_file, limits).await?;
    let tenancy = if cfg.storage.multi_tenant { Tenancy::MultiTenant } else { Tenancy::SingleTenant };
    let todos = TodoService::new(store).with_tenancy(tenancy);
    let records = todos.len().await;
    info!(data_file = %cfg.storage.data_file, ?tenancy, records, "todo store ready");

    Ok(AppState {
        todos: Arc::new(todos),
        auth: ServerAuthConfig { jwt_secret: cfg.auth.jwt_secret.clone() },
    })
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = cfg.server.bind_addr().parse()?;
    info!(%addr, "starting todo server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
