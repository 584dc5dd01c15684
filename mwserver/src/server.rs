//! # Module Server - API de haut niveau pour Axum
//!
//! Thin wrapper around an axum [`Router`] that lets each crate register its
//! routes on a shared server before it starts:
//!
//! - JSON routes with [`Server::add_route`]
//! - stateful handlers with [`Server::add_handler_with_state`]
//! - whole sub-routers with [`Server::add_router`]
//! - documented APIs with [`Server::add_openapi`] (Swagger UI included)
//!
//! Ctrl+C triggers a graceful shutdown.

use crate::logs::{create_logs_router, init_logging, LogState, LoggingOptions, LogsApiDoc};
use anyhow::{Context, Result};
use axum::handler::Handler;
use axum::routing::get;
use axum::{Json, Router};
use mwconfig::get_config;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const DEFAULT_SERVER_NAME: &str = "MistressWorld";

/// Info serveur sérialisable
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ServerInfo {
    pub name: String,
    pub base_url: String,
    pub http_port: u16,
    pub version: String,
}

/// Serveur principal
pub struct Server {
    name: String,
    base_url: String,
    http_port: u16,
    router: Arc<RwLock<Router>>,
    join_handle: Option<JoinHandle<()>>,
    log_state: Option<LogState>,
}

impl Server {
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `base_url` - Hôte annoncé (ex: "localhost")
    /// * `http_port` - Port HTTP à écouter
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            router: Arc::new(RwLock::new(Router::new())),
            join_handle: None,
            log_state: None,
        }
    }

    /// Server bound to `host.base_url` / `host.http_port`
    pub fn new_configured() -> Self {
        let config = get_config();
        Self::new(DEFAULT_SERVER_NAME, config.get_base_url(), config.get_http_port())
    }

    /// Ajoute une route JSON dynamique
    ///
    /// The closure runs on every GET to `path`.
    ///
    /// ```rust,no_run
    /// # use mwserver::Server;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", "localhost", 3000);
    /// server.add_route("/api/status", || async {
    ///     serde_json::json!({"status": "online"})
    /// }).await;
    /// # }
    /// ```
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let handler = move || {
            let f = f.clone();
            async move { Json(f().await) }
        };

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).route(path, get(handler));
    }

    /// Ajoute un handler GET avec état
    pub async fn add_handler_with_state<H, T, S>(&mut self, path: &str, handler: H, state: S)
    where
        H: Handler<T, S> + Clone + 'static,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let route = Router::new().route(path, get(handler)).with_state(state);

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(route);
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let mut r = self.router.write().await;
        let current = std::mem::take(&mut *r);

        *r = if path == "/" || path.is_empty() {
            current.merge(sub_router)
        } else {
            let normalized = format!("/{}", path.trim_matches('/'));
            current.nest(&normalized, sub_router)
        };
    }

    /// Ajoute une API documentée avec OpenAPI et Swagger UI
    ///
    /// `api_router` is mounted under `path`; the document is served at
    /// `/api-docs/{name}.json` and browsable at `/swagger-ui/{name}`.
    ///
    /// ```ignore
    /// server
    ///     .add_openapi("/api/logs", create_logs_router(state), LogsApiDoc::openapi(), "logs")
    ///     .await;
    /// ```
    pub async fn add_openapi(
        &mut self,
        path: &str,
        api_router: Router,
        openapi: utoipa::openapi::OpenApi,
        name: &str,
    ) {
        let swagger = SwaggerUi::new(format!("/swagger-ui/{}", name))
            .url(format!("/api-docs/{}.json", name), openapi);

        self.add_router(path, api_router).await;

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(swagger);
    }

    /// Copie du router courant (tests, embedding)
    pub async fn router(&self) -> Router {
        self.router.read().await.clone()
    }

    /// Démarre le serveur HTTP
    ///
    /// Binds the port right away so that an unavailable port is reported to
    /// the caller, then serves in the background until Ctrl+C.
    pub async fn start(&mut self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Cannot bind HTTP port {}", self.http_port))?;

        info!(
            "Server {} running at http://{}:{}",
            self.name, self.base_url, self.http_port
        );

        let router = self.router().await;
        self.join_handle = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                error!("HTTP server stopped: {}", e);
            }
        }));

        Ok(())
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Récupère les infos du serveur
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            http_port: self.http_port,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Buffer de logs, si [`Server::init_logging`] a été appelé
    pub fn log_state(&self) -> Option<&LogState> {
        self.log_state.as_ref()
    }

    /// Initialise le système de logging et enregistre les routes de logs
    ///
    /// Registers `/api/logs/dump` and `/api/logs/level`, documented at
    /// `/swagger-ui/logs`.
    pub async fn init_logging(&mut self, options: LoggingOptions) {
        let log_state = init_logging(options);

        self.add_openapi(
            "/api/logs",
            create_logs_router(log_state.clone()),
            LogsApiDoc::openapi(),
            "logs",
        )
        .await;

        self.log_state = Some(log_state);
    }
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C reçu, arrêt gracieux"),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    base_url: String,
    http_port: u16,
}

impl ServerBuilder {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
        }
    }

    pub fn new_configured() -> Self {
        let config = get_config();
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            base_url: config.get_base_url(),
            http_port: config.get_http_port(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        Server::new(self.name, self.base_url, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::State;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_routes_are_registered() {
        let mut server = ServerBuilder::new("Test", "localhost", 0).build();
        let info = server.info();

        server
            .add_route("/info", move || {
                let info = info.clone();
                async move { info }
            })
            .await;
        server
            .add_handler_with_state(
                "/greeting",
                |State(name): State<String>| async move { Json(serde_json::json!({ "hello": name })) },
                "world".to_string(),
            )
            .await;
        server
            .add_router(
                "/api/",
                Router::new().route("/ping", get(|| async { Json("pong") })),
            )
            .await;

        let router = server.router().await;

        let (status, json) = get_json(router.clone(), "/info").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Test");

        let (_, json) = get_json(router.clone(), "/greeting").await;
        assert_eq!(json["hello"], "world");

        let (status, json) = get_json(router.clone(), "/api/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, "pong");

        let (status, _) = get_json(router, "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let mut server = ServerBuilder::new("Test", "localhost", 0).build();
        server
            .add_openapi(
                "/api/logs",
                create_logs_router(LogState::new(4)),
                LogsApiDoc::openapi(),
                "logs",
            )
            .await;

        let router = server.router().await;
        let (status, json) = get_json(router.clone(), "/api-docs/logs.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["paths"].get("/level").is_some());

        let (status, json) = get_json(router, "/api/logs/dump").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }
}
