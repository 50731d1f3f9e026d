//! API Module
//!
//! HTTP handlers and routing exposing the cache as a JSON service.
//!
//! # Endpoints
//! - `PUT /put` - Store a record
//! - `POST /get` - Retrieve a record by key
//! - `POST /delete` - Delete a record
//! - `POST /all` - Wildcard pattern scan
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
