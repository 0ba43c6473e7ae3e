use reqwest::StatusCode;
use thiserror::Error;

use crate::constants::MAX_SESSION_DURATION_SECS;

/// Failures of the credential-to-console-URL exchange
#[derive(Debug, Error)]
pub enum FederationError {
    #[error("Session duration must be between 1 and {max} seconds, got {0}", max = MAX_SESSION_DURATION_SECS - 1)]
    InvalidDuration(i64),

    #[error("Federation endpoint rejected the token exchange ({status}): {body}")]
    RemoteExchangeFailed { status: StatusCode, body: String },

    #[error("Federation endpoint returned an unusable response: {0}")]
    MalformedResponse(String),

    #[error("No usable AWS credentials: {0}")]
    MissingCredentials(String),

    #[error("Failed to reach federation endpoint")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid federation endpoint URL")]
    InvalidEndpoint(#[from] url::ParseError),
}

pub type FederationResult<T> = Result<T, FederationError>;
