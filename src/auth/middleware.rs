//! Authentication middleware.

use super::Authenticator;
use crate::Error;
use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;

/// Authentication middleware.
///
/// Every request must carry a valid Bearer token. On success the
/// [`VerifiedToken`](super::VerifiedToken) and the authenticator are stored in
/// the request extensions for the extractors; on failure the request is
/// answered with 401 and never reaches the handler.
pub async fn auth_middleware(
    State(auth): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // Extract synchronously so no borrow of the request is held across the await
    let token = extract_bearer_token(request.headers()).map(str::to_string);

    let result = match token {
        Ok(token) => auth.authenticate_token(&token).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(verified) => {
            tracing::debug!(path = %path, sub = ?verified.claims().sub, "authenticated request");
            request.extensions_mut().insert(verified);
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(path = %path, kind = e.kind(), error = %e, "rejected request");
            e.into_rejection()
        }
    }
}

/// Require authentication on every route of `router`.
pub fn protect<S>(router: Router<S>, auth: Arc<Authenticator>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(auth, auth_middleware))
}

/// Extract Bearer token from Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
    let header = headers.get(AUTHORIZATION).ok_or(Error::MissingToken)?;

    let value = header.to_str().map_err(|_| Error::MissingToken)?;

    // Auth schemes are case-insensitive
    let (scheme, token) = value
        .trim_start()
        .split_once(char::is_whitespace)
        .ok_or(Error::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(Error::MissingToken);
    }

    Some(token.trim())
        .filter(|token| !token.is_empty())
        .ok_or(Error::MissingToken)
}
