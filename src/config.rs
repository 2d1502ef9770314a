//! Static TOML configuration for the admin tools.
//!
//! One file supplies the two API credential values, the API base URL, the
//! reserved tag namespace, and the role profiles for the role-profile tool.
//! Loaded once at startup and treated as read-only.
//!
//! Default location is `falcon-admin.toml` in the working directory; the
//! `FALCON_ADMIN_CONFIG` environment variable or a `--config` flag
//! overrides it.
//!
//! ```toml
//! client_id = "..."
//! client_secret = "..."
//! # base_url = "https://api.eu-1.crowdstrike.com"
//! # tag_namespace = "FalconGroupingTags/safe"
//!
//! [profiles]
//! default = "analyst"
//!
//! [profiles.roles]
//! analyst = ["detections_read", "rtr_read"]
//! responder = ["detections_read", "rtr_admin", "remote_responder"]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{FalconError, Result};

/// Default config file name, next to wherever the tool is invoked.
pub const DEFAULT_CONFIG_PATH: &str = "falcon-admin.toml";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "FALCON_ADMIN_CONFIG";

fn default_base_url() -> String {
    "https://api.crowdstrike.com".to_string()
}

fn default_tag_namespace() -> String {
    "FalconGroupingTags/safe".to_string()
}

/// Role profiles: named, statically configured sets of permission-role
/// identifiers, plus an optional default profile name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profiles {
    /// Profile applied when `-p/--profile` is omitted.
    #[serde(default)]
    pub default: Option<String>,

    /// Profile name → role-identifier list.
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,
}

/// The full static configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Falcon API client ID.
    pub client_id: String,
    /// Falcon API client secret.
    pub client_secret: String,

    /// API base URL; override for non-US-1 cloud regions.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Reserved tag prefix marking devices already processed by the
    /// retagging workflow.
    #[serde(default = "default_tag_namespace")]
    pub tag_namespace: String,

    /// Role profiles for the role-profile tool.
    #[serde(default)]
    pub profiles: Profiles,
}

impl Config {
    /// Loads the configuration from an explicit path, the
    /// `FALCON_ADMIN_CONFIG` environment variable, or the default file
    /// name, in that order of precedence.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV_VAR).ok();
        let path: &Path = match (path, env_path.as_deref()) {
            (Some(p), _) => p,
            (None, Some(p)) => Path::new(p),
            (None, None) => Path::new(DEFAULT_CONFIG_PATH),
        };

        let text = std::fs::read_to_string(path).map_err(|e| {
            FalconError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Parses a TOML document into a `Config`.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| FalconError::Config(e.to_string()))
    }

    /// Looks up the role set for a profile name, failing with a clear
    /// message listing the configured profiles when the name is unknown.
    pub fn profile_roles(&self, profile: &str) -> Result<&[String]> {
        self.profiles
            .roles
            .get(profile)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                let known: Vec<&str> =
                    self.profiles.roles.keys().map(String::as_str).collect();
                FalconError::Config(format!(
                    "unknown profile '{profile}' (configured: {})",
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
client_id = "abc123"
client_secret = "s3cret"
base_url = "https://api.eu-1.crowdstrike.com"
tag_namespace = "FalconGroupingTags/verified"

[profiles]
default = "analyst"

[profiles.roles]
analyst = ["detections_read", "rtr_read"]
responder = ["detections_read", "rtr_admin"]
"#;

    #[test]
    fn full_config_parses() {
        let cfg = Config::parse(FULL).unwrap();
        assert_eq!(cfg.client_id, "abc123");
        assert_eq!(cfg.client_secret, "s3cret");
        assert_eq!(cfg.base_url, "https://api.eu-1.crowdstrike.com");
        assert_eq!(cfg.tag_namespace, "FalconGroupingTags/verified");
        assert_eq!(cfg.profiles.default.as_deref(), Some("analyst"));
        assert_eq!(
            cfg.profiles.roles["responder"],
            vec!["detections_read", "rtr_admin"]
        );
    }

    #[test]
    fn minimal_config_applies_defaults() {
        let cfg = Config::parse("client_id = \"a\"\nclient_secret = \"b\"\n").unwrap();
        assert_eq!(cfg.base_url, "https://api.crowdstrike.com");
        assert_eq!(cfg.tag_namespace, "FalconGroupingTags/safe");
        assert!(cfg.profiles.default.is_none());
        assert!(cfg.profiles.roles.is_empty());
    }

    #[test]
    fn missing_credentials_is_an_error() {
        let err = Config::parse("base_url = \"https://x\"\n").unwrap_err();
        assert!(matches!(err, FalconError::Config(_)));
    }

    #[test]
    fn profile_roles_resolves_known_profile() {
        let cfg = Config::parse(FULL).unwrap();
        let roles = cfg.profile_roles("analyst").unwrap();
        assert_eq!(roles, ["detections_read", "rtr_read"]);
    }

    #[test]
    fn profile_roles_rejects_unknown_profile_with_known_names() {
        let cfg = Config::parse(FULL).unwrap();
        let err = cfg.profile_roles("superadmin").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("superadmin"));
        assert!(
            msg.contains("analyst") && msg.contains("responder"),
            "error should list the configured profiles: {msg}"
        );
    }
}
