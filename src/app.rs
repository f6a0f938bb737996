use std::net::SocketAddr;

use axum::{
    extract::{Request, State},
    http::{Method, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::{auth, posts};

#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub path: &'static str,
    pub methods: &'static [&'static str],
}

/// Everything `build_app` mounts, as served by `GET /`.
pub const ROUTES: &[RouteInfo] = &[
    RouteInfo { path: "/", methods: &["GET"] },
    RouteInfo { path: "/health", methods: &["GET"] },
    RouteInfo { path: "/register", methods: &["POST"] },
    RouteInfo { path: "/login", methods: &["POST"] },
    RouteInfo { path: "/surfposts", methods: &["GET", "POST"] },
    RouteInfo { path: "/mysurfposts", methods: &["GET"] },
    RouteInfo { path: "/myfavsurfposts", methods: &["GET"] },
    RouteInfo { path: "/surfposts/:id/like", methods: &["PATCH"] },
    RouteInfo { path: "/surfposts/:id/addfav", methods: &["PATCH"] },
    RouteInfo { path: "/surfposts/:id/update", methods: &["PATCH"] },
    RouteInfo { path: "/surfposts/:id/delete", methods: &["DELETE"] },
];

pub fn build_app(state: AppState) -> Router {
    let gated = Router::new()
        .route("/", get(list_routes))
        .merge(auth::router())
        .merge(posts::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_ready));

    Router::new()
        .merge(gated)
        .route("/health", get(health))
        .fallback(no_route)
        .method_not_allowed_fallback(wrong_method)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

/// 503 for every gated route while the store is not ready.
pub async fn require_ready(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.readiness.ready() {
        warn!(uri = %req.uri(), "store not ready, rejecting request");
        return ApiError::ServiceUnavailable.into_response();
    }
    next.run(req).await
}

async fn no_route(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

async fn wrong_method(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("{method} is not supported on {}", uri.path()))
}

async fn list_routes() -> ApiResponse<&'static [RouteInfo]> {
    ApiResponse::ok(ROUTES)
}

/// Mounted outside the readiness gate.
async fn health(State(state): State<AppState>) -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "ready": state.readiness.ready() }))
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
