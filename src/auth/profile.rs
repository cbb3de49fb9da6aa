//! Profile retrieval from the tenant's userinfo endpoint.

use crate::Error;
use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use url::Url;

/// Profile data returned by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Subject identifier (`sub`).
    pub subject: String,
    /// Display name (`name`), if the provider sent one.
    pub name: Option<String>,
    /// Response body exactly as received.
    pub raw: Bytes,
}

#[derive(Deserialize)]
struct ProfileFields {
    sub: String,
    #[serde(default)]
    name: Option<String>,
}

impl Profile {
    /// Decode a userinfo response body, keeping the body itself.
    pub fn from_body(raw: Bytes) -> Result<Self, Error> {
        let fields: ProfileFields = serde_json::from_slice(&raw).map_err(|e| {
            tracing::debug!(body_len = raw.len(), "profile body did not decode: {}", e);
            Error::ProfileDecode(e.to_string())
        })?;

        Ok(Self {
            subject: fields.sub,
            name: fields.name,
            raw,
        })
    }

    /// The raw body as JSON, for fields not modeled here.
    pub fn raw_json(&self) -> Result<serde_json::Value, Error> {
        serde_json::from_slice(&self.raw).map_err(|e| Error::ProfileDecode(e.to_string()))
    }
}

/// Calls the userinfo endpoint with the caller's bearer token.
pub struct ProfileFetcher {
    userinfo_url: Url,
    http_client: reqwest::Client,
}

impl ProfileFetcher {
    pub fn new(userinfo_url: Url, http_client: reqwest::Client) -> Self {
        Self {
            userinfo_url,
            http_client,
        }
    }

    pub fn userinfo_url(&self) -> &Url {
        &self.userinfo_url
    }

    pub async fn fetch(&self, raw_token: &str) -> Result<Profile, Error> {
        tracing::debug!("fetching profile from {}", self.userinfo_url);

        let response = self
            .http_client
            .get(self.userinfo_url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", raw_token))
            .send()
            .await
            .map_err(|e| Error::ProfileFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::ProfileFetch(format!(
                "userinfo request failed with status: {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::ProfileFetch(e.to_string()))?;

        Profile::from_body(body)
    }
}
