pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod types;

pub use auth::{Authenticator, TenantConfig};
pub use config::Config;
pub use error::{Error, Result};
