use std::{fmt, time::Duration};

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::{Url, form_urlencoded};

use super::Credentials;
use crate::{
    constants::{
        DEFAULT_AWS_DOMAIN, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_ISSUER,
        DEFAULT_SESSION_DURATION_SECS, MAX_SESSION_DURATION_SECS,
    },
    error::{FederationError, FederationResult},
};

/// Response from AWS federation getSigninToken API
#[derive(Debug, Deserialize)]
struct SigninTokenResponse {
    #[serde(rename = "SigninToken")]
    signin_token: String,
}

/// Console session duration in seconds, always within `1..43200`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDuration(u32);

impl SessionDuration {
    pub fn new(secs: i64) -> FederationResult<Self> {
        match u32::try_from(secs) {
            Ok(s) if s > 0 && i64::from(s) < MAX_SESSION_DURATION_SECS => Ok(Self(s)),
            _ => Err(FederationError::InvalidDuration(secs)),
        }
    }

    pub fn as_secs(self) -> u32 {
        self.0
    }
}

impl Default for SessionDuration {
    fn default() -> Self {
        Self(DEFAULT_SESSION_DURATION_SECS as u32)
    }
}

impl TryFrom<i64> for SessionDuration {
    type Error = FederationError;

    fn try_from(secs: i64) -> FederationResult<Self> {
        Self::new(secs)
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque bearer token issued by the federation endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct SigninToken(String);

impl SigninToken {
    pub fn new(token: impl Into<String>) -> FederationResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(FederationError::MalformedResponse(
                "SigninToken is empty".to_string(),
            ));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigninToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigninToken(<{} bytes>)", self.0.len())
    }
}

/// Endpoints and identity used for the federation exchange
#[derive(Debug, Clone)]
pub struct FederationConfig {
    /// Where `getSigninToken` requests are sent
    pub token_endpoint: String,
    /// Base of the human-facing sign-in URL
    pub signin_endpoint: String,
    pub issuer: String,
    /// Destination used when the caller does not supply one
    pub console_root: String,
    pub timeout: Duration,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self::for_domain(DEFAULT_AWS_DOMAIN)
    }
}

impl FederationConfig {
    /// Configuration for the partition the region belongs to
    pub fn for_region(region: &str) -> Self {
        Self::for_domain(console_domain(region))
    }

    fn for_domain(domain: &str) -> Self {
        let endpoint = format!("https://signin.{domain}/federation");
        Self {
            token_endpoint: endpoint.clone(),
            signin_endpoint: endpoint,
            issuer: DEFAULT_ISSUER.to_string(),
            console_root: format!("https://console.{domain}/"),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    pub fn with_signin_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.signin_endpoint = endpoint.into();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Get console domain based on region
pub fn console_domain(region: &str) -> &'static str {
    match region {
        r if r.starts_with("us-gov-") => "amazonaws-us-gov.com",
        r if r.starts_with("cn-") => "amazonaws.cn",
        _ => DEFAULT_AWS_DOMAIN,
    }
}

/// Client for the AWS federation endpoint
#[derive(Debug, Clone)]
pub struct FederationClient {
    config: FederationConfig,
    token_endpoint: Url,
    http: Client,
}

impl FederationClient {
    pub fn new(config: FederationConfig) -> FederationResult<Self> {
        let token_endpoint = Url::parse(&config.token_endpoint)?;
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            config,
            token_endpoint,
            http,
        })
    }

    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    /// Exchange temporary credentials for a signin token
    ///
    /// The duration is validated before any request is made.
    pub async fn exchange_for_signin_token(
        &self,
        credentials: &Credentials,
        duration: i64,
    ) -> FederationResult<SigninToken> {
        let duration = SessionDuration::try_from(duration)?;
        self.request_signin_token(credentials, duration).await
    }

    /// The `Session` JSON is form-encoded exactly once, by the query serializer.
    async fn request_signin_token(
        &self,
        credentials: &Credentials,
        duration: SessionDuration,
    ) -> FederationResult<SigninToken> {
        let session = json!({
            "sessionId": credentials.access_key_id,
            "sessionKey": credentials.secret_access_key,
            "sessionToken": credentials.session_token,
        });

        let mut url = self.token_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("Action", "getSigninToken")
            .append_pair("SessionDuration", &duration.to_string())
            .append_pair("Session", &session.to_string());

        debug!(
            "Requesting signin token from {} for {} seconds",
            self.token_endpoint, duration
        );

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            // The status alone identifies the failure when the body is unreadable
            let body = response.text().await.unwrap_or_default();
            return Err(FederationError::RemoteExchangeFailed { status, body });
        }

        let token_response: SigninTokenResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                FederationError::MalformedResponse(e.to_string())
            } else {
                FederationError::Transport(e)
            }
        })?;

        SigninToken::new(token_response.signin_token)
    }

    /// Build the console sign-in URL for a token
    pub fn build_signin_url(&self, token: &SigninToken, destination: &str) -> String {
        format!(
            "{}?Action=login&Issuer={}&Destination={}&SigninToken={}",
            self.config.signin_endpoint,
            form_encode(&self.config.issuer),
            form_encode(destination),
            token.as_str()
        )
    }

    /// Generate a console sign-in URL from temporary credentials
    pub async fn generate_federation_url(
        &self,
        credentials: &Credentials,
        destination: Option<&str>,
        duration: Option<i64>,
    ) -> FederationResult<String> {
        let duration = match duration {
            Some(secs) => SessionDuration::try_from(secs)?,
            None => SessionDuration::default(),
        };
        let destination = destination.unwrap_or(self.config.console_root.as_str());

        let token = self.request_signin_token(credentials, duration).await?;
        info!("Obtained signin token, destination: {}", destination);

        Ok(self.build_signin_url(&token, destination))
    }
}

fn form_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
