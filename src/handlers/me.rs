use crate::{
    Result,
    auth::{CurrentProfile, VerifiedToken},
    types::{MeResponse, TokenInfo},
};
use axum::Json;

pub async fn token_info(token: VerifiedToken) -> Json<TokenInfo> {
    let claims = token.claims();
    Json(TokenInfo {
        kid: token.header().kid.clone(),
        sub: claims.sub.clone(),
        iss: claims.iss.clone(),
        aud: claims.aud.as_ref().map(|aud| aud.to_vec()).unwrap_or_default(),
        exp: claims.exp,
    })
}

pub async fn me(CurrentProfile(profile): CurrentProfile) -> Result<Json<MeResponse>> {
    let raw = profile.raw_json()?;
    Ok(Json(MeResponse {
        sub: profile.subject,
        name: profile.name,
        profile: raw,
    }))
}
