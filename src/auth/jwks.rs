//! JWKS (JSON Web Key Set) fetching and certificate lookup.

use crate::Error;
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::KeyResolver;

const PEM_CERT_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_CERT_END: &str = "-----END CERTIFICATE-----";

/// Key resolver backed by the tenant's published JWKS document.
///
/// By default every call refetches the key set. [`JwksKeyResolver::with_cache_ttl`]
/// opts into keeping the document for a fixed time.
pub struct JwksKeyResolver {
    jwks_url: Url,
    http_client: reqwest::Client,
    cache: Option<Cache<String, Arc<Jwks>>>,
}

impl JwksKeyResolver {
    /// Create a new JWKS key resolver.
    ///
    /// # Arguments
    /// * `jwks_url` - URL to fetch JWKS from (e.g., `https://tenant.example/.well-known/jwks.json`)
    /// * `http_client` - client used for every key set request
    pub fn new(jwks_url: Url, http_client: reqwest::Client) -> Self {
        Self {
            jwks_url,
            http_client,
            cache: None,
        }
    }

    /// Keep fetched key sets for `ttl` instead of refetching per call.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = Some(Cache::builder().time_to_live(ttl).max_capacity(1).build());
        self
    }

    pub fn jwks_url(&self) -> &Url {
        &self.jwks_url
    }

    /// Fetch JWKS from the remote URL.
    async fn fetch_jwks(&self) -> Result<Jwks, Error> {
        tracing::debug!("fetching JWKS from {}", self.jwks_url);

        let response = self
            .http_client
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| Error::KeySetFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::KeySetFetch(format!(
                "JWKS fetch failed with status: {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::KeySetFetch(e.to_string()))?;

        Jwks::from_slice(&body)
    }

    /// Get JWKS, using the cache when one is configured.
    async fn get_jwks(&self) -> Result<Arc<Jwks>, Error> {
        const CACHE_KEY: &str = "jwks";

        let Some(cache) = &self.cache else {
            return Ok(Arc::new(self.fetch_jwks().await?));
        };

        if let Some(jwks) = cache.get(CACHE_KEY).await {
            tracing::debug!("using cached JWKS");
            return Ok(jwks);
        }

        let jwks = Arc::new(self.fetch_jwks().await?);
        cache.insert(CACHE_KEY.to_string(), jwks.clone()).await;
        Ok(jwks)
    }
}

#[async_trait::async_trait]
impl KeyResolver for JwksKeyResolver {
    async fn resolve_pem(&self, kid: &str) -> Result<String, Error> {
        let jwks = self.get_jwks().await?;
        jwks.certificate_pem(kid)
    }
}

/// JSON Web Key Set.
#[derive(Debug, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    pub fn from_slice(body: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(body).map_err(|e| Error::KeySetParse(e.to_string()))
    }

    /// First key whose `kid` equals `kid` exactly.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    /// PEM certificate of the first key matching `kid`.
    pub fn certificate_pem(&self, kid: &str) -> Result<String, Error> {
        self.find(kid)
            .and_then(Jwk::certificate_pem)
            .ok_or_else(|| {
                tracing::debug!("no matching key found in JWKS for kid: {:?}", kid);
                Error::KeyNotFound(kid.to_string())
            })
    }
}

/// JSON Web Key.
#[derive(Debug, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA").
    pub kty: Option<String>,
    /// Key ID.
    pub kid: Option<String>,
    /// Key use (e.g., "sig").
    #[serde(rename = "use")]
    pub use_: Option<String>,
    /// RSA modulus (base64url).
    pub n: Option<String>,
    /// RSA exponent (base64url).
    pub e: Option<String>,
    /// X.509 certificate chain, leaf first (standard base64 DER).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub x5c: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Jwk {
    /// Leading certificate of the chain wrapped in a PEM envelope.
    pub fn certificate_pem(&self) -> Option<String> {
        self.x5c.first().map(|cert| pem_certificate(cert))
    }
}

/// Wrap a base64 DER certificate in PEM delimiters without re-encoding it.
pub fn pem_certificate(x5c: &str) -> String {
    format!("{PEM_CERT_BEGIN}\n{x5c}\n{PEM_CERT_END}")
}
