//! Web API module for Folio.
//!
//! One dispatch endpoint, `/process`, accepts an `action` parameter plus
//! operation-specific parameters via query string, urlencoded form body or
//! multipart (uploads), and maps it to a store operation. Responses are
//! JSON except `read`, which returns the raw document.

pub mod auth;
pub mod cors;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use auth::{SessionGate, TokenGate};
pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
