use super::AppState;
use crate::types::{AuthenticationInfo, ServiceInfo};
use axum::{Json, extract::State};

pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "tokengate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: env!("CARGO_PKG_DESCRIPTION").to_string(),
        authentication: AuthenticationInfo {
            scheme: "Bearer",
            algorithm: "RS256",
            issuer: state.auth.issuer().to_string(),
            audience: state.auth.audience().to_string(),
        },
    })
}
