//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → server.rs (Axum setup, middleware, proxy handler)
//!     → request.rs (request ID)
//!     → [routing layer resolves or rejects the logical path]
//!     → forward.rs (target URL, credentials, streaming)
//!     → error.rs (JSON rejection bodies)
//!     → Send to client
//! ```

pub mod error;
pub mod forward;
pub mod request;
pub mod server;

pub use error::ProxyError;
pub use forward::Forwarder;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
