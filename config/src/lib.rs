//! Configuration loading for mapscout.
//!
//! Reads `~/.mapscout/config.toml`. Every section is optional; a missing file
//! is not an error. String values may reference environment variables as
//! `${NAME}`.
//!
//! ```toml
//! [app]
//! model = "gemini-2.5-flash"
//! export_dir = "~/Downloads"
//! ascii_only = false
//!
//! [api_keys]
//! google = "${GEMINI_API_KEY}"
//!
//! [location]
//! mode = "fixed"
//! latitude = 30.2672
//! longitude = -97.7431
//! area = "Austin, TX"
//! ```

use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};

use mapscout_types::{ApiKey, GeoLocation, GeoLocationError};
use serde::Deserialize;
use thiserror::Error;

/// Environment variables consulted for the Gemini key, in priority order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["GEMINI_API_KEY", "API_KEY", "GOOGLE_API_KEY"];

#[derive(Debug, Default, Deserialize)]
pub struct MapscoutConfig {
    pub app: Option<AppConfig>,
    pub api_keys: Option<ApiKeys>,
    pub location: Option<LocationConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid [location] coordinates: {0}")]
    Coordinates(#[from] GeoLocationError),
    #[error("[location] mode = \"fixed\" requires both latitude and longitude")]
    IncompleteCoordinates,
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::Coordinates(_) | ConfigError::IncompleteCoordinates => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    pub model: Option<String>,
    /// Directory for `map_data_export.json`. Defaults to the current directory.
    pub export_dir: Option<String>,
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
}

#[derive(Default, Deserialize)]
pub struct ApiKeys {
    pub google: Option<String>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let google = if self.google.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("ApiKeys").field("google", &google).finish()
    }
}

/// How the session acquires coordinates at startup.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    /// Look up approximate coordinates from the public IP address.
    #[default]
    Ip,
    /// Use the `latitude`/`longitude` from this section.
    Fixed,
    /// Never send coordinates.
    Off,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub mode: LocationMode,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Free-text area folded into the prompt, e.g. "Austin, TX".
    pub area: Option<String>,
    /// Override for the IP lookup endpoint.
    pub lookup_url: Option<String>,
}

impl LocationConfig {
    /// Coordinates for `mode = "fixed"`; `Ok(None)` for the other modes.
    pub fn fixed_coordinates(&self) -> Result<Option<GeoLocation>, ConfigError> {
        if self.mode != LocationMode::Fixed {
            return Ok(None);
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Ok(Some(GeoLocation::new(lat, lon)?)),
            _ => Err(ConfigError::IncompleteCoordinates),
        }
    }
}

/// Expand `${VAR}` references. Unset variables expand to the empty string.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Expand a leading `~` to the home directory.
#[must_use]
pub fn expand_home(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if value == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(value)
}

impl MapscoutConfig {
    /// Load from the default path. `Ok(None)` when no config file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Self::parse(&content)
            .map(Some)
            .map_err(|source| {
                tracing::warn!("Failed to parse config at {}: {source}", path.display());
                ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Resolve the Gemini API key: config first, then the env fallbacks.
    #[must_use]
    pub fn api_key(&self) -> Option<ApiKey> {
        self.api_keys
            .as_ref()
            .and_then(|keys| keys.google.as_deref())
            .map(expand_env_vars)
            .and_then(ApiKey::new)
            .or_else(api_key_from_env)
    }

    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.app.as_ref().and_then(|app| app.model.as_deref())
    }

    #[must_use]
    pub fn export_dir(&self) -> Option<PathBuf> {
        self.app
            .as_ref()
            .and_then(|app| app.export_dir.as_deref())
            .map(|dir| expand_home(&expand_env_vars(dir)))
    }

    #[must_use]
    pub fn ascii_only(&self) -> bool {
        self.app.as_ref().is_some_and(|app| app.ascii_only)
    }
}

/// First non-blank key among [`API_KEY_ENV_VARS`].
#[must_use]
pub fn api_key_from_env() -> Option<ApiKey> {
    API_KEY_ENV_VARS
        .iter()
        .find_map(|name| env::var(name).ok().and_then(ApiKey::new))
}

#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mapscout"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
