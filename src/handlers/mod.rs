//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that receives extracted request data,
//! performs its logic against the shared state, and returns a JSON response
//! in the standard envelope.

/// Credential management endpoints (admin-gated)
pub mod admin_keys;
/// Health check endpoint
pub mod health;
/// Video metadata endpoints
pub mod videos;
