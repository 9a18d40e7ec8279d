use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::gateway::config::AuthConfig;

/// Bearer token gate for the MCP endpoint.
/// Expects `Authorization: Bearer <api_token>`; the scheme is matched case-insensitively.
pub async fn require_bearer(
    State(auth): State<Arc<AuthConfig>>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let verdict = bearer_token(req.headers()).map(|token| token_matches(&auth.api_token, token));
    match verdict {
        Some(true) => next.run(req).await,
        Some(false) => {
            warn!(path = %req.uri().path(), "invalid bearer token");
            unauthorized()
        }
        None => {
            warn!(path = %req.uri().path(), "missing bearer token");
            unauthorized()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

/// An unset expected token matches nothing.
fn token_matches(expected: &str, presented: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        "invalid api key",
    )
        .into_response()
}
