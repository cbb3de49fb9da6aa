use crate::auth::TenantConfig;
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "tokengate")]
#[command(about = "Bearer token gate backed by a tenant's JWKS and userinfo endpoints")]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "TOKENGATE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "TOKENGATE_PORT", default_value = "8080")]
    pub port: u16,

    /// Tenant base URL (e.g., https://tenant.example/)
    #[arg(long, env = "TOKENGATE_TENANT")]
    pub tenant: String,

    /// Expected audience claim
    #[arg(long, env = "TOKENGATE_AUDIENCE")]
    pub audience: String,

    /// Expected issuer claim (defaults to the tenant URL as given)
    #[arg(long, env = "TOKENGATE_ISSUER")]
    pub issuer: Option<String>,

    /// How long a fetched profile is cached, in milliseconds
    #[arg(long, env = "TOKENGATE_PROFILE_CACHE_MAX_AGE_MS")]
    pub profile_cache_max_age_ms: u64,

    /// Cache the key set for this many seconds (refetched per request when unset)
    #[arg(long, env = "TOKENGATE_JWKS_CACHE_TTL_SECS")]
    pub jwks_cache_ttl_secs: Option<u64>,

    /// Timeout for key set and profile requests, in seconds
    #[arg(long, env = "TOKENGATE_HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,

    /// Enable CORS for all origins
    #[arg(long, env = "TOKENGATE_CORS", default_value = "true")]
    pub cors: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tenant_config(&self) -> crate::Result<TenantConfig> {
        let mut tenant = TenantConfig::new(
            &self.tenant,
            &self.audience,
            Duration::from_millis(self.profile_cache_max_age_ms),
        )?
        .with_key_set_ttl(self.jwks_cache_ttl_secs.map(Duration::from_secs))
        .with_http_timeout(Duration::from_secs(self.http_timeout_secs));

        if let Some(issuer) = &self.issuer {
            tenant = tenant.with_issuer(issuer);
        }

        Ok(tenant)
    }
}
