//! JWT claim checks and RS256 signature verification.

use crate::Error;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use x509_parser::public_key::PublicKey;

use super::KeyResolver;

/// Standard JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Option<String>,
    /// Issuer.
    pub iss: Option<String>,
    /// Audience.
    pub aud: Option<Aud>,
    /// Expiration time (Unix timestamp).
    #[serde(default, deserialize_with = "numeric_date")]
    pub exp: Option<u64>,
    /// Issued at (Unix timestamp).
    #[serde(default, deserialize_with = "numeric_date")]
    pub iat: Option<u64>,
    /// Not before (Unix timestamp).
    #[serde(default, deserialize_with = "numeric_date")]
    pub nbf: Option<u64>,
    /// Everything else the issuer put in the claim set.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// NumericDate may carry a fractional part; keep whole seconds.
fn numeric_date<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let date = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(date.and_then(|n| n.as_u64().or_else(|| n.as_f64().map(|secs| secs as u64))))
}

/// Audience can be a single string or array of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Aud {
    Single(String),
    Multiple(Vec<String>),
}

impl Aud {
    /// Check if the audience contains a specific value.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Aud::Single(s) => s == value,
            Aud::Multiple(v) => v.iter().any(|s| s == value),
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Aud::Single(s) => vec![s.clone()],
            Aud::Multiple(v) => v.clone(),
        }
    }
}

/// A token that passed claim and signature checks.
///
/// Keyed by its raw serialized form; two encodings of the same claims are
/// different tokens.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    raw: String,
    header: Header,
    claims: Claims,
}

impl VerifiedToken {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

/// Decode a JWT header without validation to extract the key ID.
pub fn decode_header(token: &str) -> Result<Header, Error> {
    jsonwebtoken::decode_header(token).map_err(|e| {
        tracing::debug!("failed to decode JWT header: {}", e);
        Error::MalformedToken(e.to_string())
    })
}

/// Decode the claim set without checking the signature.
pub fn decode_unverified_claims(token: &str) -> Result<Claims, Error> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(Error::MalformedToken("expected three segments".to_string())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| Error::MalformedToken(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::MalformedToken(format!("payload is not a claim set: {}", e)))
}

/// Parse a PEM certificate (or bare RSA public key) into an RS256 verification key.
pub fn rsa_key_from_pem(pem: &str) -> Result<DecodingKey, Error> {
    let parsed = ::pem::parse(pem).map_err(|e| Error::InvalidKey(e.to_string()))?;

    match parsed.tag() {
        "CERTIFICATE" => {
            let (_, cert) = x509_parser::parse_x509_certificate(parsed.contents())
                .map_err(|e| Error::InvalidKey(format!("invalid certificate: {}", e)))?;
            let spki = cert.public_key();

            match spki.parsed() {
                Ok(PublicKey::RSA(_)) => {}
                Ok(_) => {
                    return Err(Error::InvalidKey(
                        "certificate does not carry an RSA key".to_string(),
                    ));
                }
                Err(e) => return Err(Error::InvalidKey(e.to_string())),
            }

            // The BIT STRING of an RSA SubjectPublicKeyInfo is the PKCS#1 key.
            Ok(DecodingKey::from_rsa_der(&spki.subject_public_key.data))
        }
        "PUBLIC KEY" | "RSA PUBLIC KEY" => DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| Error::InvalidKey(format!("invalid RSA PEM key: {}", e))),
        other => Err(Error::InvalidKey(format!("unsupported PEM block: {}", other))),
    }
}

/// Checks audience and issuer, resolves the signing key, and verifies the token.
pub struct ClaimValidator {
    audience: String,
    issuer: String,
    resolver: Arc<dyn KeyResolver>,
}

impl ClaimValidator {
    pub fn new(audience: String, issuer: String, resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            audience,
            issuer,
            resolver,
        }
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Resolve the key that must have signed a token with this header and claims.
    ///
    /// Audience and issuer are checked before any network call. Resolver
    /// errors are returned unchanged.
    pub async fn signing_key(&self, header: &Header, claims: &Claims) -> Result<DecodingKey, Error> {
        if !claims.aud.as_ref().is_some_and(|aud| aud.contains(&self.audience)) {
            return Err(Error::InvalidAudience);
        }

        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(Error::InvalidIssuer);
        }

        if header.alg != Algorithm::RS256 {
            return Err(Error::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let kid = header.kid.as_deref().ok_or(Error::MissingKeyId)?;
        let pem = self.resolver.resolve_pem(kid).await?;

        rsa_key_from_pem(&pem)
    }

    /// Run the full check on a raw token.
    pub async fn validate(&self, token: &str) -> Result<VerifiedToken, Error> {
        let header = decode_header(token)?;
        let unverified = decode_unverified_claims(token)?;

        let key = self.signing_key(&header, &unverified).await?;
        let claims = self.verify(token, &key)?;

        Ok(VerifiedToken {
            raw: token.to_string(),
            header,
            claims,
        })
    }

    /// Verify signature and temporal claims under RS256 with no leeway.
    fn verify(&self, token: &str, key: &DecodingKey) -> Result<Claims, Error> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        jsonwebtoken::decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                match e.kind() {
                    ErrorKind::InvalidSignature => Error::SignatureVerification,
                    ErrorKind::ExpiredSignature => Error::TokenExpired,
                    ErrorKind::ImmatureSignature => Error::TokenNotYetValid,
                    ErrorKind::InvalidAudience => Error::InvalidAudience,
                    ErrorKind::InvalidIssuer => Error::InvalidIssuer,
                    ErrorKind::InvalidAlgorithm => Error::UnsupportedAlgorithm("RS256 required".to_string()),
                    ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                        Error::InvalidKey(e.to_string())
                    }
                    _ => Error::MalformedToken(e.to_string()),
                }
            })
    }
}
