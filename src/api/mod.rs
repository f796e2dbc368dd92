//! HTTP API layer.
//!
//! Exposes the patient registry as JSON endpoints under `/api/patients`.
//! Every response — success or failure — is the uniform envelope
//! `{status, message, data?}` produced by [`response::ApiResponse`].
//!
//! The router is composable — `api_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod response;
pub mod router;
pub mod server;
pub mod types;
pub mod validation;

pub use router::{api_router, api_service};
pub use server::{start_server, ApiServer};
pub use types::ApiContext;
