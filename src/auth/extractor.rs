//! Axum extractors for authenticated requests.

use super::{Authenticator, Profile, VerifiedToken};
use crate::Error;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{Extensions, request::Parts},
};
use std::sync::Arc;

/// Verified token stored by the middleware.
///
/// Fails with [`Error::NotAuthenticated`] on requests that did not pass
/// through [`auth_middleware`](super::auth_middleware).
pub fn context_token(extensions: &Extensions) -> Result<&VerifiedToken, Error> {
    extensions.get::<VerifiedToken>().ok_or(Error::NotAuthenticated)
}

/// Profile of the request's token, from cache or the userinfo endpoint.
pub async fn context_profile(extensions: &Extensions) -> Result<Profile, Error> {
    let token = context_token(extensions)?;
    let auth = extensions
        .get::<Arc<Authenticator>>()
        .ok_or(Error::NotAuthenticated)?;
    auth.profile(token).await
}

/// Extracts the token verified by the middleware.
///
/// # Example
///
/// ```ignore
/// async fn handler(token: VerifiedToken) -> impl IntoResponse {
///     format!("Hello, {:?}", token.claims().sub)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for VerifiedToken
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context_token(&parts.extensions).cloned()
    }
}

/// Extractor for the caller's profile.
///
/// # Example
///
/// ```ignore
/// async fn me(CurrentProfile(profile): CurrentProfile) -> impl IntoResponse {
///     profile.subject
/// }
/// ```
pub struct CurrentProfile(pub Profile);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentProfile
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let profile = context_profile(&parts.extensions).await.map_err(|e| {
            tracing::warn!(kind = e.kind(), error = %e, "profile lookup failed");
            e
        })?;
        Ok(CurrentProfile(profile))
    }
}
