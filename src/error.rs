use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing or malformed bearer token")]
    MissingToken,

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("invalid audience")]
    InvalidAudience,

    #[error("invalid issuer")]
    InvalidIssuer,

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token header has no key id")]
    MissingKeyId,

    #[error("failed to fetch key set: {0}")]
    KeySetFetch(String),

    #[error("failed to parse key set: {0}")]
    KeySetParse(String),

    #[error("no key in key set matches kid {0:?}")]
    KeyNotFound(String),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("signature verification failed")]
    SignatureVerification,

    #[error("token expired")]
    TokenExpired,

    #[error("token not yet valid")]
    TokenNotYetValid,

    #[error("failed to fetch profile: {0}")]
    ProfileFetch(String),

    #[error("failed to decode profile: {0}")]
    ProfileDecode(String),

    #[error("request was not authenticated")]
    NotAuthenticated,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: &'static str,
}

impl Error {
    /// Stable short name used in server-side logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MissingToken => "MissingToken",
            Error::MalformedToken(_) => "MalformedToken",
            Error::InvalidAudience => "InvalidAudience",
            Error::InvalidIssuer => "InvalidIssuer",
            Error::UnsupportedAlgorithm(_) => "UnsupportedAlgorithm",
            Error::MissingKeyId => "MissingKeyId",
            Error::KeySetFetch(_) => "KeySetFetch",
            Error::KeySetParse(_) => "KeySetParse",
            Error::KeyNotFound(_) => "KeyNotFound",
            Error::InvalidKey(_) => "InvalidKey",
            Error::SignatureVerification => "SignatureVerification",
            Error::TokenExpired => "TokenExpired",
            Error::TokenNotYetValid => "TokenNotYetValid",
            Error::ProfileFetch(_) => "ProfileFetch",
            Error::ProfileDecode(_) => "ProfileDecode",
            Error::NotAuthenticated => "NotAuthenticated",
            Error::Config(_) => "Config",
            Error::Internal(_) => "Internal",
        }
    }

    /// Whether this error rejects the caller's credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::ProfileFetch(_) | Error::ProfileDecode(_) => StatusCode::BAD_GATEWAY,
            Error::NotAuthenticated | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    // Client-facing text never carries the internal detail.
    fn public_body(&self) -> ErrorBody {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => ErrorBody {
                error: "unauthorized",
                message: "invalid or missing credentials",
            },
            StatusCode::BAD_GATEWAY => ErrorBody {
                error: "bad_gateway",
                message: "identity provider request failed",
            },
            _ => ErrorBody {
                error: "internal_error",
                message: "internal server error",
            },
        }
    }

    /// 401 response for a failed authentication, whatever the cause.
    pub fn into_rejection(self) -> Response {
        let body = ErrorBody {
            error: "unauthorized",
            message: "invalid or missing credentials",
        };
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            axum::Json(body),
        )
            .into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), axum::Json(self.public_body())).into_response()
    }
}
