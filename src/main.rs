use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use servicedesk::editor::{self, ServiceEditor};
use servicedesk::models::service::ServiceDraft;
use servicedesk::store::seed;
use servicedesk::validation::ValidationPolicy;
use servicedesk::{api, config, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "servicedesk=debug,tower_http=debug".into()),
    );
    let json_logs = std::env::var("SERVICEDESK_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(config::load()?, port).await,
        Some(cli::Commands::Validate {
            file,
            unique_keys,
            require_roles,
        }) => validate_file(
            &file,
            ValidationPolicy {
                unique_param_keys: unique_keys,
                require_roles_when_private: require_roles,
            },
        ),
        Some(cli::Commands::Endpoint { category, name }) => {
            println!("{}", editor::derive_endpoint(&category, &name));
            Ok(())
        }
        None => run_server(config::load()?, None).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(cfg.port);
    let seed_demo = cfg.seed_demo;
    let dashboard_origin = cfg.dashboard_origin.clone();

    let (state, store) = AppState::in_memory(cfg);
    if seed_demo {
        seed::seed_demo(&store)
            .await
            .context("failed to seed demo data")?;
    }
    let state = Arc::new(state);

    let app = axum::Router::new()
        // Health endpoints (no auth)
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .route("/readyz", axum::routing::get(readiness_check))
        // Admin API, nested under /api/v1 (keeps its middleware and fallback)
        .nest("/api/v1", api::api_router(state.clone()))
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        // Restrict CORS to the dashboard origin and local dev hosts
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    dashboard_origin.as_deref() == Some(origin_str)
                        || origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("authorization"),
                    HeaderName::from_static("x-admin-key"),
                    HeaderName::from_static("x-request-id"),
                ])
                .allow_credentials(true),
        )
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("servicedesk listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Validate a draft file and print the normalized definition. A missing
/// endpoint is derived from category and name.
fn validate_file(path: &Path, policy: ValidationPolicy) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let draft: ServiceDraft = if is_yaml {
        serde_yaml::from_str(&raw).context("invalid YAML draft")?
    } else {
        serde_json::from_str(&raw).context("invalid JSON draft")?
    };

    match ServiceEditor::from_draft(draft).submit(&policy) {
        Ok(def) => {
            println!("{}", serde_json::to_string_pretty(&def)?);
            Ok(())
        }
        Err(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("{}: {}", field, message);
            }
            anyhow::bail!("{} invalid field(s) in {}", errors.len(), path.display())
        }
    }
}

/// Middleware: injects a unique X-Request-Id into every response.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

async fn readiness_check() -> &'static str {
    "ok"
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    // Admin responses carry definitions; never cache them
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.remove("Server");

    resp
}
