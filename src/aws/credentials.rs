use anyhow::{Context, Result};
use aws_smithy_types::date_time::Format;
use std::{env, path::Path};
use tracing::{debug, info};

use super::{
    Credentials,
    sts::{self, AssumeRoleRequest},
};
use crate::{config, error::FederationError, prompt::Prompter};

/// Credentials supplied on the command line
#[derive(Clone, Default)]
pub struct ExplicitCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

impl ExplicitCredentials {
    /// `None` when nothing was supplied, an error when only part of it was
    pub fn into_credentials(self) -> Result<Option<Credentials>, FederationError> {
        match (self.access_key_id, self.secret_access_key, self.session_token) {
            (None, None, None) => Ok(None),
            (Some(id), Some(secret), Some(token))
                if !id.is_empty() && !secret.is_empty() && !token.is_empty() =>
            {
                Ok(Some(Credentials::new(id, secret, token)))
            }
            _ => Err(FederationError::MissingCredentials(
                "access key id, secret access key and session token must be given together"
                    .to_string(),
            )),
        }
    }
}

/// Where the credentials of a login came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Arguments,
    Environment,
    Profile(String),
}

/// Credentials plus the login defaults of the profile they came from
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub credentials: Credentials,
    pub source: CredentialSource,
    pub destination: Option<String>,
    pub duration: Option<i64>,
}

impl ResolvedCredentials {
    fn without_defaults(credentials: Credentials, source: CredentialSource) -> Self {
        Self {
            credentials,
            source,
            destination: None,
            duration: None,
        }
    }
}

/// Inputs to credential resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions<'a> {
    pub profile: Option<&'a str>,
    pub config_path: Option<&'a Path>,
    pub region: Option<&'a str>,
}

/// Read temporary credentials from the standard AWS environment variables
pub fn from_env() -> Option<Credentials> {
    let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

    Some(Credentials::new(
        var("AWS_ACCESS_KEY_ID")?,
        var("AWS_SECRET_ACCESS_KEY")?,
        var("AWS_SESSION_TOKEN")?,
    ))
}

/// Resolve credentials from arguments, environment, or a profile
pub async fn resolve(
    explicit: ExplicitCredentials,
    options: ResolveOptions<'_>,
    prompter: &dyn Prompter,
) -> Result<ResolvedCredentials> {
    if let Some(credentials) = explicit.into_credentials()? {
        debug!("credentials were retrieved from arguments");
        return Ok(ResolvedCredentials::without_defaults(
            credentials,
            CredentialSource::Arguments,
        ));
    }

    if options.profile.is_none() {
        if let Some(credentials) = from_env() {
            debug!("credentials were retrieved from env");
            return Ok(ResolvedCredentials::without_defaults(
                credentials,
                CredentialSource::Environment,
            ));
        }
    }

    from_profile(options, prompter).await
}

async fn from_profile(
    options: ResolveOptions<'_>,
    prompter: &dyn Prompter,
) -> Result<ResolvedCredentials> {
    let path = match options.config_path {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(format!("{} is not found", path.display())),
        None => config::discover_config_file().map_err(|e| format!("{e:#}")),
    }
    .map_err(|reason| {
        FederationError::MissingCredentials(format!(
            "nothing in arguments or environment, and no usable profile file: {reason}"
        ))
    })?;

    let profiles = config::load(Some(path.as_path()))?;
    let profile = profiles.select(options.profile, prompter)?;
    info!("Using profile: {}", profile.name);

    let mfa_code = profile
        .mfa_device_arn
        .as_deref()
        .map(|device| prompter.prompt_mfa_code(device))
        .transpose()?;

    let request = AssumeRoleRequest {
        role_arn: profile.resolve_role_arn()?,
        session_name: profile.session_name().to_string(),
        mfa_device_arn: profile.mfa_device_arn.clone(),
        mfa_code,
        region: options.region.map(String::from),
    };

    let assumed = sts::assume_role(&request)
        .await
        .with_context(|| format!("Failed to assume role for profile '{}'", profile.name))?;

    if let Some(expiration) = assumed.expiration {
        info!(
            "Credentials will expire at: {}",
            expiration
                .fmt(Format::DateTime)
                .unwrap_or_else(|_| "unknown".to_string())
        );
    }

    Ok(ResolvedCredentials {
        credentials: assumed.credentials,
        source: CredentialSource::Profile(profile.name.clone()),
        destination: profile.destination.clone(),
        duration: profile.duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CONFIG_FILE_ENV;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 3] = [
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
    ];

    struct NoPrompter;

    impl Prompter for NoPrompter {
        fn choose_profile(&self, _names: &[&str]) -> Result<String> {
            panic!("prompter should not be consulted")
        }

        fn prompt_mfa_code(&self, _device_arn: &str) -> Result<String> {
            panic!("prompter should not be consulted")
        }
    }

    fn with_env<T>(values: [Option<&str>; 3], f: impl FnOnce() -> T) -> T {
        let originals: Vec<Option<String>> = ENV_VARS.iter().map(|k| env::var(k).ok()).collect();

        unsafe {
            for (key, value) in ENV_VARS.iter().zip(values) {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }

        let result = f();

        unsafe {
            for (key, original) in ENV_VARS.iter().zip(originals) {
                match original {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }

        result
    }

    fn explicit(id: Option<&str>, secret: Option<&str>, token: Option<&str>) -> ExplicitCredentials {
        ExplicitCredentials {
            access_key_id: id.map(String::from),
            secret_access_key: secret.map(String::from),
            session_token: token.map(String::from),
        }
    }

    #[test]
    fn test_explicit_credentials_complete() {
        let creds = explicit(Some("AK"), Some("SK"), Some("ST"))
            .into_credentials()
            .unwrap();
        assert_eq!(creds, Some(Credentials::new("AK", "SK", "ST")));
    }

    #[test]
    fn test_explicit_credentials_absent() {
        assert_eq!(explicit(None, None, None).into_credentials().unwrap(), None);
    }

    #[test]
    fn test_explicit_credentials_partial() {
        for partial in [
            explicit(Some("AK"), None, None),
            explicit(Some("AK"), Some("SK"), None),
            explicit(None, None, Some("ST")),
            explicit(Some("AK"), Some(""), Some("ST")),
        ] {
            assert!(matches!(
                partial.into_credentials(),
                Err(FederationError::MissingCredentials(_))
            ));
        }
    }

    #[test]
    #[serial]
    fn test_from_env_complete() {
        let creds = with_env([Some("AK"), Some("SK"), Some("ST")], from_env);
        assert_eq!(creds, Some(Credentials::new("AK", "SK", "ST")));
    }

    #[test]
    #[serial]
    fn test_from_env_incomplete() {
        assert_eq!(with_env([Some("AK"), Some("SK"), None], from_env), None);
        assert_eq!(with_env([Some("AK"), Some(""), Some("ST")], from_env), None);
        assert_eq!(with_env([None, None, None], from_env), None);
    }

    #[tokio::test]
    #[serial]
    async fn test_resolve_prefers_arguments() {
        let originals: Vec<Option<String>> = ENV_VARS.iter().map(|k| env::var(k).ok()).collect();
        unsafe {
            for key in ENV_VARS {
                env::set_var(key, "from-env");
            }
        }

        let resolved = resolve(
            explicit(Some("AK"), Some("SK"), Some("ST")),
            ResolveOptions::default(),
            &NoPrompter,
        )
        .await
        .unwrap();

        unsafe {
            for (key, original) in ENV_VARS.iter().zip(originals) {
                match original {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }

        assert_eq!(resolved.source, CredentialSource::Arguments);
        assert_eq!(resolved.credentials.access_key_id, "AK");
        assert_eq!(resolved.destination, None);
    }

    #[tokio::test]
    #[serial]
    async fn test_resolve_falls_back_to_env() {
        let originals: Vec<Option<String>> = ENV_VARS.iter().map(|k| env::var(k).ok()).collect();
        unsafe {
            env::set_var("AWS_ACCESS_KEY_ID", "ENV_AK");
            env::set_var("AWS_SECRET_ACCESS_KEY", "ENV_SK");
            env::set_var("AWS_SESSION_TOKEN", "ENV_ST");
        }

        let resolved = resolve(
            ExplicitCredentials::default(),
            ResolveOptions::default(),
            &NoPrompter,
        )
        .await;

        unsafe {
            for (key, original) in ENV_VARS.iter().zip(originals) {
                match original {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }

        let resolved = resolved.unwrap();
        assert_eq!(resolved.source, CredentialSource::Environment);
        assert_eq!(resolved.credentials, Credentials::new("ENV_AK", "ENV_SK", "ENV_ST"));
    }

    #[tokio::test]
    async fn test_resolve_partial_arguments_is_missing_credentials() {
        let err = resolve(
            explicit(Some("AK"), None, None),
            ResolveOptions::default(),
            &NoPrompter,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FederationError>(),
            Some(FederationError::MissingCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_without_any_source_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.ini");

        // An explicit profile skips the environment, so this reaches the profile file.
        let err = resolve(
            ExplicitCredentials::default(),
            ResolveOptions {
                profile: Some("dev"),
                config_path: Some(missing.as_path()),
                region: None,
            },
            &NoPrompter,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("no usable profile file"));
        assert!(err.to_string().contains("absent.ini"));
        assert!(matches!(
            err.downcast_ref::<FederationError>(),
            Some(FederationError::MissingCredentials(_))
        ));
    }

    #[tokio::test]
    #[serial]
    async fn test_resolve_nothing_discovered_is_missing_credentials() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.ini");
        let originals: Vec<Option<String>> = ENV_VARS.iter().map(|k| env::var(k).ok()).collect();
        let original_config = env::var(CONFIG_FILE_ENV).ok();
        unsafe {
            for key in ENV_VARS {
                env::remove_var(key);
            }
            env::set_var(CONFIG_FILE_ENV, &missing);
        }

        let result = resolve(
            ExplicitCredentials::default(),
            ResolveOptions::default(),
            &NoPrompter,
        )
        .await;

        unsafe {
            for (key, original) in ENV_VARS.iter().zip(originals) {
                match original {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
            match original_config {
                Some(v) => env::set_var(CONFIG_FILE_ENV, v),
                None => env::remove_var(CONFIG_FILE_ENV),
            }
        }

        let err = result.unwrap_err();
        assert!(err.to_string().contains("missing.ini"));
        assert!(matches!(
            err.downcast_ref::<FederationError>(),
            Some(FederationError::MissingCredentials(_))
        ));
    }
}
