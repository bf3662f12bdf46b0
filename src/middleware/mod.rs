//! HTTP middleware components.
//!
//! Middleware run before route handlers. They can authenticate requests,
//! attach context, and short-circuit unauthorized requests.

/// Operator admin guard
pub mod admin;
/// API key authentication middleware (required and optional modes)
pub mod auth;
