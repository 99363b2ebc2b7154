use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Serve `app` with request tracing and permissive CORS for the dashboard UI.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    let app = app.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );
    axum::serve(listener, app).await
}
