//! API key authentication middleware.
//!
//! Every gated request walks the same pipeline: extract the `X-API-Key`
//! header, parse the composite key, verify it against the store, check the
//! rolling-hour quota, run the handler, record a usage row. The pipeline
//! short-circuits at the first rejecting step.
//!
//! Two modes share the pipeline:
//! - **required**: any non-authorized outcome rejects the request
//! - **optional**: missing, malformed, and unverified credentials fall
//!   through to anonymous access; a quota-exhausted credential is still
//!   rejected, so the fallback cannot be used to dodge the limit

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    models::{api_key::ApiKey, usage::NewUsage},
    services::{key_service, usage_service},
    state::AppState,
};

/// Header carrying the per-caller credential.
const API_KEY_HEADER: &str = "x-api-key";

/// Authentication context attached to authorized requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<AuthContext>` to know who is calling.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Internal id of the verified credential
    pub api_key_id: i64,

    /// Operator-assigned label of the key
    pub key_name: String,

    /// The key's hourly quota
    pub rate_limit_per_hour: i32,
}

/// Terminal state of the authentication pipeline for one request.
enum AuthOutcome {
    /// No credential header was presented
    NoCredential,
    /// A header was presented but did not parse as `yt_<keyId>_<secret>`
    Malformed,
    /// Parsed, but unknown key, inactive key, or wrong secret
    Unverified,
    /// Verified, but the trailing-hour window is full
    QuotaExceeded(ApiKey),
    /// Verified and under quota
    Authorized(ApiKey),
    /// The store failed while evaluating quota; denied in both modes
    StoreFailure,
}

/// Walk header extraction → parse → verify → quota, short-circuiting at the
/// first non-authorized state.
async fn evaluate(state: &AppState, headers: &HeaderMap) -> AuthOutcome {
    let raw = match headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok()) {
        Some(raw) => raw,
        None => return AuthOutcome::NoCredential,
    };

    // Fail fast: malformed input never reaches the store
    let parsed = match key_service::parse_api_key(raw) {
        Some(parsed) => parsed,
        None => return AuthOutcome::Malformed,
    };

    let record = match key_service::verify(&*state.store, parsed.key_id, parsed.key_secret).await {
        Some(record) => record,
        None => return AuthOutcome::Unverified,
    };

    match usage_service::has_capacity(&*state.store, record.id, record.rate_limit_per_hour).await {
        Ok(true) => AuthOutcome::Authorized(record),
        Ok(false) => AuthOutcome::QuotaExceeded(record),
        Err(err) => {
            tracing::warn!(error = %err, "quota check failed; denying request");
            AuthOutcome::StoreFailure
        }
    }
}

/// Required-mode middleware: only `Authorized` requests reach the handler.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let outcome = evaluate(&state, request.headers()).await;

    match outcome {
        AuthOutcome::NoCredential | AuthOutcome::Malformed => {
            AppError::ApiKeyRequired.into_response()
        }
        AuthOutcome::Unverified | AuthOutcome::StoreFailure => {
            AppError::InvalidApiKey.into_response()
        }
        AuthOutcome::QuotaExceeded(record) => reject_over_quota(&state, record, &request),
        AuthOutcome::Authorized(record) => run_handler(state, record, request, next, started).await,
    }
}

/// Optional-mode middleware: unauthenticated access is allowed, but a
/// credential that identifies itself and is out of quota is still rejected.
pub async fn optional_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let outcome = evaluate(&state, request.headers()).await;

    match outcome {
        // Anonymous continuation: no identity attached, no usage recorded
        AuthOutcome::NoCredential | AuthOutcome::Malformed | AuthOutcome::Unverified => {
            next.run(request).await
        }
        AuthOutcome::StoreFailure => AppError::InvalidApiKey.into_response(),
        AuthOutcome::QuotaExceeded(record) => reject_over_quota(&state, record, &request),
        AuthOutcome::Authorized(record) => run_handler(state, record, request, next, started).await,
    }
}

/// Build the 429 response and record the rejected attempt against the key.
fn reject_over_quota(state: &AppState, record: ApiKey, request: &Request) -> Response {
    let error = AppError::RateLimitExceeded {
        limit: record.rate_limit_per_hour,
    };
    let message = error.to_string();
    let response = error.into_response();

    usage_service::record(
        state.store.clone(),
        NewUsage {
            api_key_id: record.id,
            endpoint: request.uri().path().to_string(),
            response_status: response.status().as_u16().into(),
            processing_time_ms: None,
            error_message: Some(message),
        },
    );

    response
}

/// Attach the identity, run the handler, then record the outcome.
async fn run_handler(
    state: AppState,
    record: ApiKey,
    mut request: Request,
    next: Next,
    started: Instant,
) -> Response {
    let endpoint = request.uri().path().to_string();

    let context = AuthContext {
        api_key_id: record.id,
        key_name: record.name.clone(),
        rate_limit_per_hour: record.rate_limit_per_hour,
    };
    tracing::debug!(
        api_key_id = context.api_key_id,
        key = %context.key_name,
        limit = context.rate_limit_per_hour,
        endpoint = %endpoint,
        "authenticated request"
    );
    request.extensions_mut().insert(context);

    let response = next.run(request).await;
    let status = response.status();

    let error_message = if status.is_success() {
        None
    } else {
        Some(
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        )
    };

    usage_service::record(
        state.store.clone(),
        NewUsage {
            api_key_id: record.id,
            endpoint,
            response_status: status.as_u16().into(),
            processing_time_ms: Some(
                i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX),
            ),
            error_message,
        },
    );

    response
}
