//! Business logic services.
//!
//! Services contain the core subsystem logic separated from HTTP handlers:
//! credential material, quota evaluation, and the upstream metadata fetch.

pub mod key_service;
pub mod metadata_service;
pub mod usage_service;
