//! Logging: tracing registry, in-memory ring buffer and log endpoints
//!
//! [`init_logging`] installs a registry made of a reloadable level filter, a
//! [`BufferLayer`] keeping the last events in memory, and an optional console
//! `fmt` layer. The buffer and the level are exposed over HTTP by
//! [`create_logs_router`]:
//!
//! - `GET  /dump`  - buffered entries, oldest first
//! - `GET  /level` - current level
//! - `POST /level` - change the level (`{"level": "DEBUG"}`)

mod layer;

pub use layer::BufferLayer;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use mwconfig::Config;
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    sync::{Arc, PoisonError, RwLock},
    time::SystemTime,
};
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt, Registry,
};

const LEVELS: [&str; 5] = ["ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

/// Représente une entrée de log
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LogEntry {
    #[schema(value_type = Object)]
    pub timestamp: SystemTime,
    pub level: String,
    pub target: String,
    pub message: String,
}

type ReloadHandle = reload::Handle<LevelFilter, Registry>;

/// Buffer circulaire partagé
#[derive(Clone)]
pub struct LogState {
    buffer: Arc<RwLock<VecDeque<LogEntry>>>,
    capacity: usize,
    max_level: Arc<RwLock<Level>>,
    reload_handle: Option<ReloadHandle>,
}

impl LogState {
    /// A buffer not attached to any subscriber
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            max_level: Arc::new(RwLock::new(Level::TRACE)),
            reload_handle: None,
        }
    }

    fn with_reload(capacity: usize, level: Level, handle: ReloadHandle) -> Self {
        let mut state = Self::new(capacity);
        state.max_level = Arc::new(RwLock::new(level));
        state.reload_handle = Some(handle);
        state
    }

    /// Changes the level and reloads the subscriber filter, if any
    pub fn set_max_level(&self, level: Level) {
        *self
            .max_level
            .write()
            .unwrap_or_else(PoisonError::into_inner) = level;

        if let Some(handle) = &self.reload_handle {
            if let Err(e) = handle.reload(LevelFilter::from_level(level)) {
                tracing::warn!("Failed to reload log level filter: {}", e);
            }
        }
    }

    pub fn get_max_level(&self) -> Level {
        *self
            .max_level
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, entry: LogEntry) {
        let mut buf = self
            .buffer
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        while buf.len() >= self.capacity {
            buf.pop_front();
        }
        buf.push_back(entry);
    }

    /// Copie du buffer, du plus ancien au plus récent
    pub fn dump(&self) -> Vec<LogEntry> {
        self.buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

/// Options d'initialisation du système de logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Capacité du buffer circulaire (nombre d'entrées conservées)
    pub buffer_capacity: usize,
    /// Niveau minimal enregistré
    pub min_level: Level,
    /// Activer la sortie vers stderr/stdout
    pub enable_console: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            min_level: Level::INFO,
            enable_console: true,
        }
    }
}

impl LoggingOptions {
    /// Reads `host.logger.*`, keeping defaults for missing or invalid values
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            buffer_capacity: config
                .get_log_cache_size()
                .unwrap_or(defaults.buffer_capacity),
            min_level: config
                .get_log_min_level()
                .ok()
                .and_then(|l| string_to_level(&l))
                .unwrap_or(defaults.min_level),
            enable_console: config
                .get_log_enable_console()
                .unwrap_or(defaults.enable_console),
        }
    }
}

/// Installe le subscriber global et retourne le buffer associé
///
/// If a global subscriber is already set (tests, embedding), the buffer is
/// still returned but stays empty.
pub fn init_logging(options: LoggingOptions) -> LogState {
    let (filter, reload_handle) = reload::Layer::new(LevelFilter::from_level(options.min_level));
    let log_state =
        LogState::with_reload(options.buffer_capacity, options.min_level, reload_handle);

    // le filtre doit précéder les autres couches
    let subscriber = Registry::default()
        .with(filter)
        .with(BufferLayer::new(log_state.clone()));

    let result = if options.enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }

    log_state
}

/// Query params pour /dump
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct DumpQuery {
    /// Keep only this level (case-insensitive)
    #[serde(default)]
    pub level: Option<String>,
    /// Keep entries whose message or target contains this text
    #[serde(default)]
    pub search: Option<String>,
}

fn filter_entry(entry: &LogEntry, q: &DumpQuery) -> bool {
    let level_ok = q
        .level
        .as_deref()
        .is_none_or(|l| entry.level.eq_ignore_ascii_case(l));
    let search_ok = q
        .search
        .as_deref()
        .is_none_or(|s| entry.message.contains(s) || entry.target.contains(s));
    level_ok && search_ok
}

/// Handler REST (dump JSON du buffer)
#[utoipa::path(
    get,
    path = "/dump",
    params(DumpQuery),
    responses(
        (status = 200, description = "Buffered log entries", body = Vec<LogEntry>)
    ),
    tag = "logs"
)]
pub async fn log_dump(
    State(state): State<LogState>,
    Query(query): Query<DumpQuery>,
) -> impl IntoResponse {
    let entries: Vec<LogEntry> = state
        .dump()
        .into_iter()
        .filter(|e| filter_entry(e, &query))
        .collect();
    Json(entries)
}

/// Request body pour la configuration du logging
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LogLevelRequest {
    pub level: String,
}

/// Response pour la configuration du logging
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LogLevelResponse {
    pub current_level: String,
    pub available_levels: Vec<String>,
}

impl LogLevelResponse {
    fn new(level: Level) -> Self {
        Self {
            current_level: level.to_string(),
            available_levels: LEVELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Handler pour GET /level - retourne le niveau actuel
#[utoipa::path(
    get,
    path = "/level",
    responses(
        (status = 200, description = "Current log level", body = LogLevelResponse)
    ),
    tag = "logs"
)]
pub async fn log_level_get(State(state): State<LogState>) -> impl IntoResponse {
    Json(LogLevelResponse::new(state.get_max_level()))
}

/// Handler pour POST /level - met à jour le niveau de log
#[utoipa::path(
    post,
    path = "/level",
    request_body = LogLevelRequest,
    responses(
        (status = 200, description = "Log level updated", body = LogLevelResponse),
        (status = 400, description = "Invalid log level")
    ),
    tag = "logs"
)]
pub async fn log_level_post(
    State(state): State<LogState>,
    Json(payload): Json<LogLevelRequest>,
) -> impl IntoResponse {
    let Some(level) = string_to_level(&payload.level) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("Invalid log level. Must be one of: {}", LEVELS.join(", "))
            })),
        )
            .into_response();
    };

    state.set_max_level(level);
    tracing::info!("Log level changed to: {}", level);

    Json(LogLevelResponse::new(level)).into_response()
}

pub fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// Crée le router pour l'API de gestion des logs
pub fn create_logs_router(log_state: LogState) -> Router {
    Router::new()
        .route("/dump", get(log_dump))
        .route("/level", get(log_level_get).post(log_level_post))
        .with_state(log_state)
}

/// API OpenAPI pour la gestion des logs
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(log_dump, log_level_get, log_level_post),
    components(schemas(LogEntry, LogLevelRequest, LogLevelResponse)),
    tags((name = "logs", description = "Log buffer and level endpoints"))
)]
pub struct LogsApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn entry(level: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: SystemTime::now(),
            level: level.to_string(),
            target: "mwserver::tests".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let state = LogState::new(2);
        state.push(entry("INFO", "one"));
        state.push(entry("INFO", "two"));
        state.push(entry("WARN", "three"));

        let messages: Vec<_> = state.dump().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_string_to_level() {
        assert_eq!(string_to_level("debug"), Some(Level::DEBUG));
        assert_eq!(string_to_level(" Warning "), Some(Level::WARN));
        assert_eq!(string_to_level("loud"), None);
    }

    #[tokio::test]
    async fn test_dump_filters() {
        let state = LogState::new(10);
        state.push(entry("INFO", "cache hit"));
        state.push(entry("WARN", "dropping filter"));

        let response = create_logs_router(state)
            .oneshot(
                Request::builder()
                    .uri("/dump?level=warn")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["message"], "dropping filter");
    }

    #[tokio::test]
    async fn test_level_endpoints() {
        let state = LogState::new(10);
        let router = create_logs_router(state.clone());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/level")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"level":"debug"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.get_max_level(), Level::DEBUG);

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/level")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"level":"loud"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
