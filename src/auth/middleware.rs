use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::basic::parse_basic;
use crate::error::AppError;
use crate::AppState;

/// The username the request was authenticated as.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic)
        .ok_or_else(|| {
            tracing::warn!("Access denied: missing or malformed credentials");
            AppError::Unauthorized
        })?;

    // argon2 verification is CPU-bound; keep it off the async workers.
    let users = state.users.clone();
    let (credentials, granted) = tokio::task::spawn_blocking(move || {
        let granted = users.verify(&credentials);
        (credentials, granted)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("credential check panicked: {e}")))?;

    if !granted {
        tracing::warn!(username = %credentials.username, "Access denied");
        return Err(AppError::Forbidden);
    }

    tracing::info!(username = %credentials.username, "Access granted");
    req.extensions_mut().insert(AuthUser {
        username: credentials.username,
    });
    Ok(next.run(req).await)
}
