//! Request audit log
//!
//! Records `{method, endpoint, user_id?, status_code, message}` for every
//! request. The caller is resolved from the bearer token when one is
//! present and valid. A failure to record never changes the response.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    ui::{middleware::auth::bearer_token, state::AppState},
    usecase::RequestRecord,
};

pub async fn audit_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let endpoint = request.uri().path().to_string();
    let user_id = bearer_token(request.headers())
        .and_then(|token| state.authenticator.authenticate(token).ok())
        .map(|user| user.user_id);

    let response = next.run(request).await;

    let status = response.status();
    let record = RequestRecord {
        method,
        endpoint,
        user_id,
        status_code: status.as_u16(),
        message: status.canonical_reason().unwrap_or("Unknown").to_string(),
    };
    if let Err(e) = state.record_request_usecase.execute(record).await {
        tracing::error!("Failed to record request: {}", e);
    }

    response
}
