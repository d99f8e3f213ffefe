//! REST boundary for ProjDeck.
//!
//! Transport-agnostic: a host server maps its requests onto `ApiRequest`
//! and writes back `ApiResponse`.

pub mod api;
pub mod routes;

pub use api::{ApiRequest, ApiResponse, ProjdeckApi};
pub use routes::Route;
