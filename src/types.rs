use serde::Serialize;

/// Public description of the running service.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub authentication: AuthenticationInfo,
}

#[derive(Debug, Serialize)]
pub struct AuthenticationInfo {
    pub scheme: &'static str,
    pub algorithm: &'static str,
    pub issuer: String,
    pub audience: String,
}

/// Claims of the caller's verified token.
#[derive(Debug, Serialize)]
pub struct TokenInfo {
    pub kid: Option<String>,
    pub sub: Option<String>,
    pub iss: Option<String>,
    pub aud: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// The caller's profile as reported by the identity provider.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Full provider response.
    pub profile: serde_json::Value,
}
