use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the optional settings file inside the config directory.
pub const SETTINGS_FILE: &str = "config.yaml";


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwitcherSettings {
    /// Where bare profile names are stored. Default: `<home>/Monitor Profiles`,
    /// or empty when there is no home directory.
    #[serde(default = "default_profile_dir")]
    pub profile_dir: PathBuf,
    /// Extension appended to profile names that have none. Default: `monitorprofile`.
    #[serde(default = "default_profile_extension")]
    pub profile_extension: String,
    /// Rewrite saved adapter ids to the live ones before applying. Default: true.
    #[serde(default = "default_match_adapter_ids")]
    pub match_adapter_ids: bool,
    /// Borrow live desktop-image modes for profiles saved without them. Default: false.
    #[serde(default)]
    pub inject_desktop_images: bool,
}

fn default_profile_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Monitor Profiles"))
        .unwrap_or_default()
}

fn default_profile_extension() -> String {
    "monitorprofile".into()
}

fn default_match_adapter_ids() -> bool {
    true
}

impl Default for SwitcherSettings {
    fn default() -> Self {
        SwitcherSettings {
            profile_dir: default_profile_dir(),
            profile_extension: default_profile_extension(),
            match_adapter_ids: default_match_adapter_ids(),
            inject_desktop_images: false,
        }
    }
}

impl SwitcherSettings {
    /// Load `config.yaml` from `config_dir`. A missing file yields the defaults.
    pub fn load(config_dir: &Path) -> Result<SwitcherSettings, ConfigError> {
        let path = config_dir.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SwitcherSettings::default());
            }
            Err(e) => return Err(ConfigError::Read { path, source: e }),
        };
        if raw.trim().is_empty() {
            return Ok(SwitcherSettings::default());
        }
        serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse { path, source: e })
    }
}


/// Resolve the config directory: `$MONSWITCH_CONFIG_DIR`, else the platform
/// config dir joined with `monswitch`.
pub fn resolve_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MONSWITCH_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("monswitch")
}
