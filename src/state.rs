//! Shared application state.

use std::sync::Arc;

use crate::{
    middleware::admin::AdminGuard, services::metadata_service::MetadataFetcher, store::KeyStore,
};

/// State shared with every handler and middleware via axum's `State`
/// extractor.
///
/// The store and fetcher are trait objects so tests can wire in fakes; the
/// admin guard carries the operator secret loaded once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyStore>,
    pub admin: Arc<AdminGuard>,
    pub fetcher: Arc<dyn MetadataFetcher>,
}
