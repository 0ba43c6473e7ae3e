use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::Client as StsClient;
use aws_smithy_types::DateTime;
use tracing::{debug, info};

use super::Credentials;
use crate::{constants::DEFAULT_AWS_REGION, error::FederationError};

/// Credentials returned by AssumeRole together with their expiry
#[derive(Debug, Clone)]
pub struct AssumedRole {
    pub credentials: Credentials,
    pub expiration: Option<DateTime>,
}

/// Parameters of an AssumeRole call
#[derive(Debug, Clone, Default)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub mfa_device_arn: Option<String>,
    pub mfa_code: Option<String>,
    pub region: Option<String>,
}

/// Build role ARN from account id and role name
pub fn build_role_arn(account: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{account}:role/{role_name}")
}

/// Assume role, optionally gated by an MFA code
pub async fn assume_role(request: &AssumeRoleRequest) -> Result<AssumedRole> {
    info!("Calling AWS STS AssumeRole");
    debug!("Role ARN: {}", request.role_arn);
    debug!("Session name: {}", request.session_name);

    if request.mfa_device_arn.is_some() && request.mfa_code.is_none() {
        anyhow::bail!("An MFA code is required for this profile");
    }

    // Priority: explicit region -> ENV vars / config file -> DEFAULT_AWS_REGION
    let config = {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &request.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let loaded = loader.load().await;

        match loaded.region() {
            Some(region) => {
                info!("Using region: {}", region);
                loaded
            }
            None => {
                info!(
                    "No region configured, using default {} for STS",
                    DEFAULT_AWS_REGION
                );
                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(DEFAULT_AWS_REGION))
                    .load()
                    .await
            }
        }
    };

    let client = StsClient::new(&config);

    match &request.mfa_device_arn {
        Some(device) => debug!("MFA device ARN: {}", device),
        None => debug!("mfa_device_arn was not passed"),
    }

    let response = client
        .assume_role()
        .role_arn(&request.role_arn)
        .role_session_name(&request.session_name)
        .set_serial_number(request.mfa_device_arn.clone())
        .set_token_code(request.mfa_code.clone())
        .send()
        .await
        .context("Failed to assume role")?;

    let sts_creds = response.credentials().ok_or_else(|| {
        FederationError::MissingCredentials("AWS STS returned no credentials".to_string())
    })?;

    let assumed = AssumedRole {
        credentials: Credentials::new(
            sts_creds.access_key_id(),
            sts_creds.secret_access_key(),
            sts_creds.session_token(),
        ),
        expiration: Some(*sts_creds.expiration()),
    };

    info!("Successfully obtained AWS credentials");
    Ok(assumed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_role_arn() {
        assert_eq!(
            build_role_arn("123456789012", "DeepRacerTrainingRole"),
            "arn:aws:iam::123456789012:role/DeepRacerTrainingRole"
        );
    }

    #[tokio::test]
    async fn test_assume_role_requires_mfa_code_when_device_set() {
        let request = AssumeRoleRequest {
            role_arn: build_role_arn("123456789012", "Admin"),
            session_name: "tester".to_string(),
            mfa_device_arn: Some("arn:aws:iam::123456789012:mfa/tester".to_string()),
            mfa_code: None,
            region: Some("us-east-1".to_string()),
        };

        let err = assume_role(&request).await.unwrap_err();
        assert!(err.to_string().contains("MFA code"));
    }
}
