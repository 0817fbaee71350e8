//! Bearer-token middleware for the REST surface

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::gateway::{
    state::AppState,
    types::{error_codes, ApiResponse},
};

use super::service::Claims;

type AuthRejection = (StatusCode, Json<ApiResponse<()>>);

fn reject(status: StatusCode, code: i32, msg: &str) -> AuthRejection {
    (status, Json(ApiResponse::<()>::error(code, msg)))
}

/// Verify the Authorization header and inject `Claims` into request
/// extensions for downstream extractors.
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthRejection> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            reject(
                StatusCode::UNAUTHORIZED,
                error_codes::MISSING_AUTH,
                "Missing Authorization header",
            )
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        reject(
            StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "Invalid token format",
        )
    })?;

    match state.auth.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(_) => Err(reject(
            StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "Invalid or expired token",
        )),
    }
}

/// Reject non-operator callers. Layered after `jwt_auth_middleware` on the
/// admin routes, so `Claims` is always present here.
pub async fn require_operator(
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthRejection> {
    let claims = request.extensions().get::<Claims>().ok_or_else(|| {
        reject(
            StatusCode::UNAUTHORIZED,
            error_codes::MISSING_AUTH,
            "Missing Authorization header",
        )
    })?;

    if !claims.role.is_operator() {
        return Err(reject(
            StatusCode::FORBIDDEN,
            error_codes::FORBIDDEN,
            "Operator role required",
        ));
    }

    Ok(next.run(request).await)
}
