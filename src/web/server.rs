use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::cors::{CorsLayer, Any};

use crate::application_state::ApplicationState;
use super::api::{AppState, create_api_router};

pub fn create_router(app: Arc<ApplicationState>, static_dir: Option<&str>) -> Router {
    let api_router = create_api_router(AppState { app });

    let mut router = Router::new().nest("/api", api_router);
    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }
    router.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

pub async fn start_web_server(
    app: Arc<ApplicationState>,
    port: u16,
    static_dir: Option<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let router = create_router(app, static_dir.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Web server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .await
        .map_err(|e| format!("Server error: {}", e).into())
}
