//! API Module
//!
//! HTTP handlers and routing exposing the cache and verified sessions to a
//! local client.
//!
//! # Endpoints
//! - `PUT /cache` - Store a JSON value
//! - `GET /cache/:key` - Retrieve a live value
//! - `DELETE /cache/:key` - Invalidate one key
//! - `DELETE /cache` - Invalidate every entry
//! - `POST /cache/sweep` - Remove expired entries now
//! - `POST /sessions` - Record a verified email
//! - `DELETE /sessions` - Forget all verified emails
//! - `GET /sessions/verified?email=` - Check a verified email
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
