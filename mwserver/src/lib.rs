//! # mwserver - Serveur web haut niveau basé sur Axum
//!
//! Shared HTTP server for MistressWorld. Crates register their routes on a
//! [`Server`] (usually through an extension trait such as `CatalogServerExt`)
//! and the binary starts it.
//!
//! ## Fonctionnalités
//!
//! - **Routes JSON** : `add_route`, `add_handler_with_state`, `add_router`
//! - **Documentation OpenAPI** : Swagger UI per registered API
//! - **Logs** : tracing registry with an in-memory buffer and a reloadable
//!   level, exposed at `/api/logs`
//! - **Arrêt gracieux** sur Ctrl+C
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use mwserver::{logs::LoggingOptions, ServerBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", "localhost", 8080).build();
//!     server.init_logging(LoggingOptions::default()).await;
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{log_dump, BufferLayer, LogState, LoggingOptions};
pub use server::{Server, ServerBuilder, ServerInfo};
