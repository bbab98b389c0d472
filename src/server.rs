use crate::cache::Credentials;
use crate::config::Config;
use crate::error::AppError;
use crate::translation::{Translation, Translator};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION},
        HeaderMap, HeaderValue,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, error, info};

/// Request headers browsers may send cross-origin
const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    /// Kept untyped so falsy non-string values count as missing
    pub ingredient_name: Option<Value>,
    pub target_language: Option<String>,
}

impl TranslateRequest {
    /// The requested name. `null`, `false`, `0` and `""` are treated as
    /// absent; any other non-string value is an internal failure.
    pub fn ingredient_name(self) -> Result<String, AppError> {
        match self.ingredient_name {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Err(AppError::MissingInput),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(AppError::MissingInput),
            Some(Value::String(name)) if name.is_empty() => Err(AppError::MissingInput),
            Some(Value::String(name)) => Ok(name),
            Some(other) => Err(AppError::Internal(anyhow!(
                "ingredient_name must be a string, got {}",
                other
            ))),
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub translator: Translator,
    pub max_body_bytes: usize,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let translate = post(translate_ingredient).options(preflight);

    Router::new()
        .route("/", translate.clone())
        .route("/translate-ingredient", translate)
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        // Same CORS headers on every response, preflight included
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .with_state(state)
}

async fn preflight() -> &'static str {
    "ok"
}

async fn health() -> &'static str {
    "OK"
}

async fn translate_ingredient(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Translation>, AppError> {
    // Unreadable or oversized bodies are internal failures, as are malformed ones
    let body = body.map_err(|e| anyhow!("Failed to read translation request body: {}", e))?;
    let request: TranslateRequest =
        serde_json::from_slice(&body).context("Failed to parse translation request body")?;

    let target_language = request.target_language.clone();
    let ingredient_name = request.ingredient_name()?;
    debug!(
        "Translating '{}' (target_language={})",
        ingredient_name,
        target_language.as_deref().unwrap_or("zh")
    );

    let auth = Credentials {
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let translation = state.translator.translate(&ingredient_name, &auth).await?;
    Ok(Json(translation))
}

/// Serve on an already-bound listener until a shutdown signal arrives
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down");
    Ok(())
}

/// Bind the configured port and serve
pub async fn run(config: &Config, state: AppState) -> Result<()> {
    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("✓ Server listening on {}", address);
    serve(listener, state).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
