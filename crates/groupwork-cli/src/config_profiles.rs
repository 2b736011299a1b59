//! Named backend profiles, stored as JSON under the user's config directory.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use groupwork_core::config::ClientConfig;
use groupwork_core::util::normalize_text_option;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

const PROFILE_ENV: &str = "GROUPWORK_PROFILE";
const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileFile {
    pub active_profile: Option<String>,
    pub profiles: BTreeMap<String, Profile>,
}

/// Overrides of the client defaults for one backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Profile {
    pub api_base_url: Option<String>,
    pub poll_interval_secs: Option<u64>,
}

pub fn profiles_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("groupwork")
        .join("profiles.json")
}

fn file_error(action: &str, path: &Path, error: impl Display) -> CliError {
    CliError::Config(format!("Failed to {action} {}: {error}", path.display()))
}

impl ProfileFile {
    pub fn load() -> Result<Self, CliError> {
        Self::read(&profiles_path())
    }

    /// A missing file reads as an empty set of profiles.
    pub fn read(path: &Path) -> Result<Self, CliError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(error) => return Err(file_error("read", path, error)),
        };
        serde_json::from_str(&raw).map_err(|error| file_error("parse", path, error))
    }

    pub fn save(&self) -> Result<PathBuf, CliError> {
        let path = profiles_path();
        self.write(&path)?;
        Ok(path)
    }

    pub fn write(&self, path: &Path) -> Result<(), CliError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|error| file_error("create", dir, error))?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(|error| file_error("write", path, error))
    }

    /// `--profile`, then `GROUPWORK_PROFILE`, then the active profile, then `default`.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        self.pick_profile_name(explicit, std::env::var(PROFILE_ENV).ok())
    }

    fn pick_profile_name(&self, explicit: Option<&str>, from_env: Option<String>) -> String {
        [
            explicit.map(str::to_owned),
            from_env,
            self.active_profile.clone(),
        ]
        .into_iter()
        .find_map(normalize_text_option)
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    pub fn is_configured(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn profile_mut(&mut self, name: &str) -> &mut Profile {
        self.profiles.entry(name.to_string()).or_default()
    }

    /// Settings for `name`; an unconfigured profile runs on the environment
    /// and built-in defaults alone.
    pub fn client_config(&self, name: &str) -> groupwork_core::Result<ClientConfig> {
        match self.profiles.get(name) {
            Some(profile) => profile.client_config_with(|key| std::env::var(key).ok()),
            None => ClientConfig::from_env(),
        }
    }
}

impl Profile {
    /// Profile values over the defaults, then `GROUPWORK_*` overrides from `lookup`.
    pub fn client_config_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> groupwork_core::Result<ClientConfig> {
        let defaults = ClientConfig::default();
        ClientConfig {
            api_base_url: normalize_text_option(self.api_base_url.clone())
                .unwrap_or(defaults.api_base_url),
            poll_interval_secs: self.poll_interval_secs.unwrap_or(defaults.poll_interval_secs),
            ..defaults
        }
        .with_overrides(lookup)
    }
}
