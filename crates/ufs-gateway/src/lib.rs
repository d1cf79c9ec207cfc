//! # UFS Gateway
//!
//! HTTP gateway that multiplexes resumable uploads and ranged, compressed
//! downloads across named file stores.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                 Gateway middleware                  │
//! │   OPTIONS preflight │ POST upload │ GET download    │
//! ├─────────────────────────────────────────────────────┤
//! │  Range │ Read hooks │ Transform │ Compression       │
//! │          (per-request fault boundary)               │
//! ├─────────────────────────────────────────────────────┤
//! │                    ufs-store                        │
//! │       (Store trait, catalog, memory / disk)         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Requests outside the configured prefix, and GET requests that do not
//! address a file, fall through to the wrapped application.

pub mod config;
pub mod encoding;
pub mod error;
pub mod fault;
pub mod handlers;
pub mod middleware;
pub mod path;
pub mod range;
pub mod routes;
pub mod server;
pub mod state;
pub mod stream;
pub mod temp;
pub mod uploads;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use routes::create_router;
pub use server::{run_server, run_server_with_shutdown, serve};
pub use state::AppState;
