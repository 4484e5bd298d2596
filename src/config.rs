use std::fs;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::KeepPolicy;
use crate::error::KiraError;

pub const DEFAULT_CONFIG_FILE: &str = "kira-dbc.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    /// `"first"` or `"all"`; anything else is rejected when resolving.
    #[serde(default)]
    pub keep: Option<String>,
    #[serde(default)]
    pub exclude_list: Option<String>,
    #[serde(default)]
    pub max_contigs: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub keep: KeepPolicy,
    pub exclude_list: Option<Utf8PathBuf>,
    pub max_contigs: Option<usize>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            keep: KeepPolicy::First,
            exclude_list: None,
            max_contigs: None,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `kira-dbc.json` from the working directory when no
    /// path is given. Only the implicit file may be absent.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KiraError> {
        let config_path = Utf8PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));

        if !config_path.as_std_path().exists() {
            if path.is_none() {
                debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                return Ok(ResolvedConfig::default());
            }
            return Err(KiraError::MissingConfig(config_path));
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KiraError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KiraError> {
        let keep = config
            .keep
            .as_deref()
            .map(str::parse::<KeepPolicy>)
            .transpose()?
            .unwrap_or_default();

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            keep,
            exclude_list: config.exclude_list.map(Utf8PathBuf::from),
            max_contigs: config.max_contigs,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved, ResolvedConfig::default());
    }

    #[test]
    fn unknown_policy_fails_fast() {
        let config = Config {
            keep: Some("newest".to_string()),
            ..Config::default()
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, KiraError::InvalidPolicy(_));
    }
}
