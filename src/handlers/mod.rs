mod me;
mod service_info;

pub use me::{me, token_info};
pub use service_info::service_info;

use crate::auth::{Authenticator, protect};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Authenticator>,
}

/// Build the service router: public service info, everything else behind the bearer check.
pub fn create_router(state: AppState) -> Router {
    let protected: Router<AppState> = Router::new()
        .route("/me", get(me))
        .route("/token", get(token_info));
    let protected = protect(protected, state.auth.clone());

    Router::new()
        .route("/", get(service_info))
        .route("/service-info", get(service_info))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
