use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod handlers;
pub mod roles;

/// Build the admin API router.
/// All routes are relative; the caller mounts this under `/api/v1`.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route("/services/validate", post(handlers::validate_service))
        .route("/services/endpoint", post(handlers::derive_endpoint))
        .route(
            "/services/:id",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .route("/services/:id/access", post(handlers::check_access))
        .route("/services/:id/test", post(handlers::prepare_test))
        .route("/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/roles/:id",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route("/permissions", get(roles::list_permissions))
        .route("/notifications/stream", get(handlers::stream_notices))
        .layer(middleware::from_fn_with_state(state, admin_auth))
        .layer(TraceLayer::new_for_http())
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware: validates `X-Admin-Key` (or a bearer token) against the
/// configured admin key. Returns 401 if missing or invalid.
async fn admin_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided_key = req
        .headers()
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.trim())
        });

    let expected = state.config.admin_key.as_bytes();

    match provided_key {
        Some(k) if bool::from(k.as_bytes().ct_eq(expected)) => Ok(next.run(req).await),
        Some(k) => {
            // Never log the expected key or the full provided key
            let masked = if k.len() > 8 && k.is_char_boundary(4) && k.is_char_boundary(k.len() - 4) {
                format!("{}...{}", &k[..4], &k[k.len() - 4..])
            } else {
                "****".to_string()
            };
            tracing::warn!("admin API: invalid key (provided: '{}')", masked);
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("admin API: missing X-Admin-Key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
