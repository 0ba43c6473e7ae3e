use std::{env, path::PathBuf};

/// Application directory name under the user's config and cache directories
pub const APP_DIR_NAME: &str = "aws-federation-login";

/// Profile file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Profile file name looked up in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "aws-federation-login.ini";

/// Environment variable pointing at an explicit profile file
pub const CONFIG_FILE_ENV: &str = "AWS_FEDERATION_LOGIN_CONFIG";

/// Issuer reported to the sign-in endpoint
pub const DEFAULT_ISSUER: &str = "aws-federation-login";

/// Domain of the commercial AWS partition
pub const DEFAULT_AWS_DOMAIN: &str = "aws.amazon.com";

/// Default AWS region for STS operations when no region is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Default console session duration (4 hours)
pub const DEFAULT_SESSION_DURATION_SECS: i64 = 14_400;

/// Exclusive upper bound of the console session duration (12 hours)
pub const MAX_SESSION_DURATION_SECS: i64 = 43_200;

/// Role session name used when the profile does not set one
pub const DEFAULT_SESSION_NAME: &str = "AnonymousUser";

/// Default timeout for the federation HTTP call
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// File name of the rendered sign-in page
pub const SIGNIN_PAGE_FILE_NAME: &str = "signin.html";

/// Get the candidate profile file paths in lookup order
/// Respects AWS_FEDERATION_LOGIN_CONFIG environment variable if set
pub fn config_file_candidates() -> Vec<PathBuf> {
    if let Ok(path) = env::var(CONFIG_FILE_ENV) {
        return vec![PathBuf::from(path)];
    }

    let mut candidates = vec![PathBuf::from(".").join(LOCAL_CONFIG_FILE_NAME)];
    if let Some(home) = dirs::home_dir() {
        candidates.push(
            home.join(".config")
                .join(APP_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }
    candidates
}

/// Directory the sign-in page is written to
/// Falls back to the system temp directory when no cache directory exists
pub fn build_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_file_candidates_with_env() {
        let original = env::var(CONFIG_FILE_ENV).ok();

        unsafe {
            env::set_var(CONFIG_FILE_ENV, "/custom/federation.ini");
        }
        let candidates = config_file_candidates();
        assert_eq!(candidates, vec![PathBuf::from("/custom/federation.ini")]);

        unsafe {
            match original {
                Some(val) => env::set_var(CONFIG_FILE_ENV, val),
                None => env::remove_var(CONFIG_FILE_ENV),
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_file_candidates_default() {
        let original = env::var(CONFIG_FILE_ENV).ok();

        unsafe {
            env::remove_var(CONFIG_FILE_ENV);
        }
        let candidates = config_file_candidates();

        assert_eq!(candidates[0], PathBuf::from(".").join(LOCAL_CONFIG_FILE_NAME));
        if let Some(p) = candidates.get(1) {
            let path_str = p.to_string_lossy();
            assert!(path_str.contains(APP_DIR_NAME));
            assert!(path_str.ends_with(CONFIG_FILE_NAME));
        }

        unsafe {
            if let Some(val) = original {
                env::set_var(CONFIG_FILE_ENV, val);
            }
        }
    }

    #[test]
    fn test_build_dir_is_app_scoped() {
        assert!(build_dir().ends_with(APP_DIR_NAME));
    }
}
