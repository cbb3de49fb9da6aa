//! Bearer token authentication against a tenant's published keys.
//!
//! This module provides:
//! - JWKS and static PEM key resolvers
//! - Audience/issuer checks ahead of RS256 signature verification
//! - Profile lookup from the tenant's userinfo endpoint, cached per raw token
//! - axum middleware and extractors for protected routes

pub mod cache;
mod extractor;
pub mod jwks;
pub mod jwt;
mod middleware;
pub mod profile;

pub use cache::ProfileCache;
pub use extractor::{CurrentProfile, context_profile, context_token};
pub use jwks::JwksKeyResolver;
pub use jwt::{Aud, ClaimValidator, Claims, VerifiedToken};
pub use middleware::{auth_middleware, extract_bearer_token, protect};
pub use profile::{Profile, ProfileFetcher};

use crate::Error;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default timeout for key set and profile requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for one tenant.
#[derive(Debug, Clone)]
pub struct TenantConfig {
    /// Tenant base URL, always ending in `/`.
    pub tenant: Url,
    /// Expected audience claim.
    pub audience: String,
    /// Expected issuer claim.
    pub issuer: String,
    /// How long a fetched profile is served from cache.
    pub profile_max_age: Duration,
    /// Cache the key set for this long; `None` refetches on every validation.
    pub key_set_ttl: Option<Duration>,
    /// Timeout applied to each outbound request.
    pub http_timeout: Duration,
}

impl TenantConfig {
    /// Build a tenant configuration. The issuer defaults to `tenant` exactly as given.
    pub fn new(tenant: &str, audience: &str, profile_max_age: Duration) -> Result<Self, Error> {
        Ok(Self {
            tenant: tenant_base(tenant)?,
            audience: audience.to_string(),
            issuer: tenant.to_string(),
            profile_max_age,
            key_set_ttl: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.issuer = issuer.to_string();
        self
    }

    pub fn with_key_set_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.key_set_ttl = ttl;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// `{tenant}/.well-known/jwks.json`
    pub fn jwks_url(&self) -> Result<Url, Error> {
        self.endpoint(".well-known/jwks.json")
    }

    /// `{tenant}/userinfo`
    pub fn userinfo_url(&self) -> Result<Url, Error> {
        self.endpoint("userinfo")
    }

    fn endpoint(&self, suffix: &str) -> Result<Url, Error> {
        self.tenant
            .join(suffix)
            .map_err(|e| Error::Config(format!("invalid endpoint {}: {}", suffix, e)))
    }
}

/// Parse the tenant URL so relative joins append to its path.
fn tenant_base(tenant: &str) -> Result<Url, Error> {
    let mut url =
        Url::parse(tenant).map_err(|e| Error::Config(format!("invalid tenant URL {:?}: {}", tenant, e)))?;

    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("tenant URL {:?} cannot be a base", tenant)));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Trait for resolving the PEM key a token was signed with.
#[async_trait::async_trait]
pub trait KeyResolver: Send + Sync {
    /// Get the PEM-encoded certificate or public key for the token header's `kid`.
    async fn resolve_pem(&self, kid: &str) -> Result<String, Error>;
}

/// Static key resolver (PEM certificate or RSA public key), ignoring `kid`.
pub struct StaticKeyResolver {
    pem: String,
}

impl StaticKeyResolver {
    /// Create a resolver from a PEM document, checking it is a usable RSA key.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        jwt::rsa_key_from_pem(pem)?;
        Ok(Self {
            pem: pem.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve_pem(&self, _kid: &str) -> Result<String, Error> {
        Ok(self.pem.clone())
    }
}

/// Validates bearer tokens for one tenant and serves their profiles.
///
/// Each instance owns its own profile cache.
pub struct Authenticator {
    validator: ClaimValidator,
    fetcher: ProfileFetcher,
    cache: ProfileCache,
}

impl Authenticator {
    /// Create an authenticator that resolves keys from the tenant's JWKS.
    pub fn new(config: TenantConfig) -> Result<Self, Error> {
        let http_client = http_client(config.http_timeout)?;

        let mut resolver = JwksKeyResolver::new(config.jwks_url()?, http_client.clone());
        if let Some(ttl) = config.key_set_ttl {
            resolver = resolver.with_cache_ttl(ttl);
        }

        Self::build(config, Arc::new(resolver), http_client)
    }

    /// Create an authenticator with a custom key resolver.
    pub fn with_key_resolver(
        config: TenantConfig,
        resolver: Arc<dyn KeyResolver>,
    ) -> Result<Self, Error> {
        let http_client = http_client(config.http_timeout)?;
        Self::build(config, resolver, http_client)
    }

    fn build(
        config: TenantConfig,
        resolver: Arc<dyn KeyResolver>,
        http_client: reqwest::Client,
    ) -> Result<Self, Error> {
        let fetcher = ProfileFetcher::new(config.userinfo_url()?, http_client);
        let validator = ClaimValidator::new(config.audience, config.issuer, resolver);

        Ok(Self {
            validator,
            fetcher,
            cache: ProfileCache::new(config.profile_max_age),
        })
    }

    /// Validate a raw bearer token.
    pub async fn authenticate_token(&self, raw_token: &str) -> Result<VerifiedToken, Error> {
        self.validator.validate(raw_token).await
    }

    /// Profile for a verified token, from cache or the userinfo endpoint.
    ///
    /// Only successful fetches are cached.
    pub async fn profile(&self, token: &VerifiedToken) -> Result<Profile, Error> {
        if let Some(profile) = self.cache.get(token.raw()) {
            tracing::debug!("profile cache hit");
            return Ok(profile);
        }

        let profile = self.fetch_profile(token).await?;
        self.cache.put(token.raw(), profile.clone());
        Ok(profile)
    }

    /// Fetch the profile without consulting or filling the cache.
    pub async fn fetch_profile(&self, token: &VerifiedToken) -> Result<Profile, Error> {
        self.fetcher.fetch(token.raw()).await
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    pub fn audience(&self) -> &str {
        self.validator.audience()
    }

    pub fn issuer(&self) -> &str {
        self.validator.issuer()
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Internal(format!("failed to create HTTP client: {}", e)))
}
