use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::TimeoutConfig;
use crate::output::SCHEMA_FILE_NAME;

/// Header value as written in the config file. Non-string scalars are sent
/// in their textual form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderScalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for HeaderScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, HeaderScalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointConfig>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "sdl-fetch")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    pub fn get_endpoint(&self, name: Option<&str>) -> Option<&EndpointConfig> {
        let endpoint_name = name.or(self.default.as_deref())?;
        self.endpoints.get(endpoint_name)
    }

    pub fn add_endpoint(&mut self, name: String, endpoint: EndpointConfig) {
        self.endpoints.insert(name, endpoint);
    }

    pub fn remove_endpoint(&mut self, name: &str) -> bool {
        let removed = self.endpoints.remove(name).is_some();

        if self.default.as_deref() == Some(name) {
            self.default = None;
        }

        removed
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.endpoints.contains_key(name) {
            anyhow::bail!("Endpoint '{name}' not found in configuration");
        }
        self.default = Some(name.to_string());
        Ok(())
    }
}

/// Values given on the command line for a single download.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub endpoint: Option<String>,
    pub headers: Vec<(String, String)>,
    pub connect_timeout: Option<u64>,
    pub read_timeout: Option<u64>,
    pub output_dir: PathBuf,
}

impl Overrides {
    /// An explicit endpoint without a profile is used as-is; the config file
    /// is only read when a profile has to supply the endpoint.
    pub const fn needs_config(&self) -> bool {
        self.profile.is_some() || self.endpoint.is_none()
    }
}

/// Everything a single download needs, resolved from all sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub timeout: TimeoutConfig,
    pub output_dir: PathBuf,
}

impl DownloadTarget {
    /// Priority: CLI args > named profile > default profile.
    pub fn resolve(overrides: Overrides, config: &Config) -> Result<Self> {
        let profile = if overrides.needs_config() {
            let Some(profile) = config.get_endpoint(overrides.profile.as_deref()) else {
                match overrides.profile.as_deref() {
                    Some(name) => anyhow::bail!("Endpoint '{name}' not found in configuration"),
                    None => anyhow::bail!(
                        "No endpoint configured. Pass --endpoint <url> or use \
                        'sdl-fetch config add <name> --endpoint <url>' to add one."
                    ),
                }
            };
            Some(profile)
        } else {
            None
        };

        // Header names are case-insensitive; key them lowercase so CLI
        // values replace profile values regardless of spelling.
        let mut headers: BTreeMap<String, String> = profile
            .map(|p| {
                p.headers
                    .iter()
                    .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        headers.extend(
            overrides
                .headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value)),
        );

        let endpoint = overrides
            .endpoint
            .or_else(|| profile.map(|p| p.url.clone()))
            .context("No endpoint configured")?;

        let timeout = TimeoutConfig::new(
            overrides
                .connect_timeout
                .or_else(|| profile.and_then(|p| p.connect_timeout)),
            overrides
                .read_timeout
                .or_else(|| profile.and_then(|p| p.read_timeout)),
        );

        Ok(Self {
            endpoint,
            headers,
            timeout,
            output_dir: overrides.output_dir,
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(SCHEMA_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn endpoint(url: &str) -> EndpointConfig {
        EndpointConfig {
            url: url.to_string(),
            connect_timeout: None,
            read_timeout: None,
            headers: BTreeMap::new(),
        }
    }

    fn sample_config() -> Config {
        let mut config = Config::default();
        let mut local = endpoint("http://localhost:8080/sdl");
        local.read_timeout = Some(2_000);
        local.headers.insert(
            "Authorization".to_string(),
            HeaderScalar::String("Bearer local".to_string()),
        );
        local
            .headers
            .insert("X-Schema-Version".to_string(), HeaderScalar::Integer(2));
        config.add_endpoint("local".to_string(), local);
        config.add_endpoint(
            "staging".to_string(),
            endpoint("https://staging.example.test/sdl"),
        );
        config.default = Some("local".to_string());
        config
    }

    fn overrides() -> Overrides {
        Overrides {
            output_dir: PathBuf::from("build"),
            ..Overrides::default()
        }
    }

    #[test]
    fn default_config_has_no_endpoints_and_no_default() {
        let config = Config::default();
        assert!(config.default.is_none());
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn add_endpoint_with_existing_name_overwrites_previous_config() {
        let mut config = sample_config();
        config.add_endpoint("local".to_string(), endpoint("http://127.0.0.1:9000/sdl"));

        let local = config.endpoints.get("local").unwrap();
        assert_eq!(local.url, "http://127.0.0.1:9000/sdl");
        assert!(local.headers.is_empty());
    }

    #[test]
    fn get_endpoint_with_name_returns_matching_endpoint() {
        let config = sample_config();

        let staging = config.get_endpoint(Some("staging")).unwrap();
        assert_eq!(staging.url, "https://staging.example.test/sdl");
    }

    #[test]
    fn get_endpoint_without_name_returns_default_endpoint() {
        let config = sample_config();

        let local = config.get_endpoint(None).unwrap();
        assert_eq!(local.url, "http://localhost:8080/sdl");
    }

    #[test]
    fn get_endpoint_without_name_returns_none_when_no_default_set() {
        let mut config = sample_config();
        config.default = None;

        assert!(config.get_endpoint(None).is_none());
    }

    #[test]
    fn remove_endpoint_clears_default_when_removing_default_endpoint() {
        let mut config = sample_config();

        assert!(config.remove_endpoint("local"));
        assert!(config.default.is_none());
        assert_eq!(config.endpoints.len(), 1);
    }

    #[test]
    fn remove_endpoint_preserves_default_when_removing_other_endpoint() {
        let mut config = sample_config();

        assert!(config.remove_endpoint("staging"));
        assert_eq!(config.default.as_deref(), Some("local"));
    }

    #[test]
    fn remove_endpoint_returns_false_for_unknown_endpoint() {
        let mut config = sample_config();

        assert!(!config.remove_endpoint("nonexistent"));
        assert_eq!(config.endpoints.len(), 2);
    }

    #[test]
    fn set_default_returns_error_for_unknown_endpoint() {
        let mut config = sample_config();

        let err = config.set_default("nonexistent").unwrap_err();
        assert!(err.to_string().contains("not found in configuration"));
        assert_eq!(config.default.as_deref(), Some("local"));
    }

    #[test]
    fn headers_accept_any_scalar_and_render_as_text() {
        let toml_str = r#"
[endpoints.local]
url = "http://localhost:8080/sdl"

[endpoints.local.headers]
Authorization = "Bearer abc"
X-Retries = 3
X-Ratio = 0.5
X-Debug = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let headers = &config.endpoints.get("local").unwrap().headers;

        let rendered: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("X-Debug".to_string(), "true".to_string()),
                ("X-Ratio".to_string(), "0.5".to_string()),
                ("X-Retries".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn config_survives_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = sample_config();

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_missing_file_returns_default_config() {
        let dir = TempDir::new().unwrap();

        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn resolve_uses_cli_endpoint_without_touching_profiles() {
        let target = DownloadTarget::resolve(
            Overrides {
                endpoint: Some("https://example.test/graphql".to_string()),
                ..overrides()
            },
            &sample_config(),
        )
        .unwrap();

        assert_eq!(target.endpoint, "https://example.test/graphql");
        assert!(target.headers.is_empty());
        assert_eq!(target.timeout, TimeoutConfig::default());
        assert_eq!(target.output_path(), PathBuf::from("build/schema.graphql"));
    }

    #[test]
    fn resolve_falls_back_to_default_profile() {
        let target = DownloadTarget::resolve(overrides(), &sample_config()).unwrap();

        assert_eq!(target.endpoint, "http://localhost:8080/sdl");
        assert_eq!(
            target.headers.get("authorization").map(String::as_str),
            Some("Bearer local")
        );
        assert_eq!(
            target.headers.get("x-schema-version").map(String::as_str),
            Some("2")
        );
        assert_eq!(target.timeout, TimeoutConfig::new(None, Some(2_000)));
    }

    #[test]
    fn resolve_merges_cli_values_over_named_profile() {
        let target = DownloadTarget::resolve(
            Overrides {
                profile: Some("local".to_string()),
                endpoint: Some("http://localhost:9090/sdl".to_string()),
                headers: vec![("Authorization".to_string(), "Bearer cli".to_string())],
                read_timeout: Some(500),
                ..overrides()
            },
            &sample_config(),
        )
        .unwrap();

        assert_eq!(target.endpoint, "http://localhost:9090/sdl");
        assert_eq!(
            target.headers.get("authorization").map(String::as_str),
            Some("Bearer cli")
        );
        assert_eq!(target.headers.len(), 2);
        assert_eq!(target.timeout.read_ms, 500);
    }

    #[test]
    fn resolve_lets_cli_header_win_over_profile_header_with_other_casing() {
        let mut config = sample_config();
        let local = config.endpoints.get_mut("local").unwrap();
        local.headers.clear();
        local.headers.insert(
            "authorization".to_string(),
            HeaderScalar::String("Bearer profile".to_string()),
        );

        let target = DownloadTarget::resolve(
            Overrides {
                headers: vec![
                    ("Authorization".to_string(), "Bearer cli".to_string()),
                    ("X-Trace".to_string(), "on".to_string()),
                ],
                ..overrides()
            },
            &config,
        )
        .unwrap();

        let expected: BTreeMap<String, String> = [
            ("authorization".to_string(), "Bearer cli".to_string()),
            ("x-trace".to_string(), "on".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(target.headers, expected);
    }

    #[test]
    fn resolve_fails_for_unknown_profile() {
        let err = DownloadTarget::resolve(
            Overrides {
                profile: Some("prod".to_string()),
                ..overrides()
            },
            &sample_config(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("'prod' not found"));
    }

    #[test]
    fn resolve_fails_without_any_endpoint() {
        let err = DownloadTarget::resolve(overrides(), &Config::default()).unwrap_err();

        assert!(err.to_string().contains("No endpoint configured"));
    }
}
