use anyhow::{Context, Result, bail};
use ini::{Ini, Properties};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{
    aws::sts::build_role_arn,
    constants::{self, DEFAULT_SESSION_NAME},
    prompt::Prompter,
};

/// One `[profile <name>]` section of the profile file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub role_arn: Option<String>,
    pub account: Option<String>,
    pub role: Option<String>,
    pub session_name: Option<String>,
    /// Console URL to land on after sign-in
    pub destination: Option<String>,
    pub mfa_device_arn: Option<String>,
    /// Console session duration in seconds
    pub duration: Option<i64>,
}

impl Profile {
    fn from_ini_section(name: &str, section: &Properties) -> Result<Self> {
        let get = |key: &str| {
            section
                .get(key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let duration = get("duration")
            .map(|d| d.parse::<i64>())
            .transpose()
            .with_context(|| format!("Invalid duration in profile '{name}'"))?;

        Ok(Self {
            name: name.to_string(),
            role_arn: get("role_arn"),
            account: get("account"),
            role: get("role"),
            session_name: get("session_name"),
            destination: get("destination"),
            mfa_device_arn: get("mfa_device_arn"),
            duration,
        })
    }

    /// Role ARN from `role_arn`, or built from `account` and `role`
    pub fn resolve_role_arn(&self) -> Result<String> {
        match (&self.role_arn, &self.account, &self.role) {
            (Some(arn), _, _) => Ok(arn.clone()),
            (None, Some(account), Some(role)) => Ok(build_role_arn(account, role)),
            _ => bail!(
                "Profile '{}' needs either role_arn or both account and role",
                self.name
            ),
        }
    }

    pub fn session_name(&self) -> &str {
        self.session_name.as_deref().unwrap_or(DEFAULT_SESSION_NAME)
    }
}

/// Profiles of a profile file, in file order
#[derive(Debug, Clone)]
pub struct ProfileMap {
    profiles: Vec<Profile>,
}

impl ProfileMap {
    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let profiles = ini
            .iter()
            .filter_map(|(section, props)| section.map(|s| (profile_name(s), props)))
            .map(|(name, props)| Profile::from_ini_section(name, props))
            .collect::<Result<Vec<_>>>()?;

        if profiles.is_empty() {
            bail!("no profile found");
        }

        Ok(Self { profiles })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Pick the requested profile, the only profile, or ask the prompter
    pub fn select(&self, requested: Option<&str>, prompter: &dyn Prompter) -> Result<&Profile> {
        if let Some(name) = requested {
            return self.get(name).with_context(|| {
                format!(
                    "Profile '{name}' not found. Available profiles: {}",
                    self.names().join(", ")
                )
            });
        }

        if let [only] = self.profiles.as_slice() {
            return Ok(only);
        }

        let chosen = prompter.choose_profile(&self.names())?;
        self.get(&chosen)
            .with_context(|| format!("Profile '{chosen}' not found"))
    }
}

fn profile_name(section: &str) -> &str {
    section
        .strip_prefix("profile ")
        .map_or(section, str::trim)
}

/// Find the first existing profile file
pub fn discover_config_file() -> Result<PathBuf> {
    let candidates = constants::config_file_candidates();

    candidates
        .iter()
        .find(|candidate| candidate.exists())
        .cloned()
        .with_context(|| {
            let searched = candidates
                .iter()
                .map(|c| c.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("profile file is not found (searched: {searched})")
        })
}

/// Load profiles from `path`, or from the discovered profile file
pub fn load(path: Option<&Path>) -> Result<ProfileMap> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => discover_config_file()?,
    };

    debug!("Loading profiles from {}", path.display());

    let ini = Ini::load_from_file(&path)
        .with_context(|| format!("Failed to load profile file {}", path.display()))?;

    ProfileMap::from_ini(&ini).with_context(|| format!("Invalid profile file {}", path.display()))
}
