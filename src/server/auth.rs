//! API key authentication for the `/api` routes.

use crate::config::AuthConfig;
use crate::server::AppContext;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeader,
};
use subtle::ConstantTimeEq;

/// Check a bearer token against the configured API key.
fn check_auth(
    auth_config: &AuthConfig,
    bearer_token: Option<&str>,
) -> Result<(), (StatusCode, &'static str)> {
    if !auth_config.enabled {
        return Ok(());
    }

    match (bearer_token, auth_config.api_key.as_deref()) {
        (Some(token), Some(api_key))
            if !api_key.is_empty() && bool::from(token.as_bytes().ct_eq(api_key.as_bytes())) =>
        {
            Ok(())
        }
        _ => Err((StatusCode::UNAUTHORIZED, "Authentication required")),
    }
}

/// Middleware for API key authentication
pub async fn api_auth_middleware(
    State(ctx): State<AppContext>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let bearer_token = bearer.map(|b| b.token().to_string());

    if let Err(rejection) = check_auth(&ctx.config.server.auth, bearer_token.as_deref()) {
        tracing::warn!(
            path = %request.uri().path(),
            "Rejected unauthenticated API request"
        );
        return Err(rejection);
    }

    Ok(next.run(request).await)
}
