use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{SourceKind, SourceSpecifier};
use crate::enrich::EnrichOptions;
use crate::error::KgError;

pub const CONFIG_FILE: &str = "culture-kg.json";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_GRAPH_NAME: &str = "culture_kg";
pub const DEFAULT_ENRICH_DELAY_MS: u64 = 350;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
    #[serde(default)]
    pub media_ingredients: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub graph_name: Option<String>,
    #[serde(default)]
    pub enrich: Option<EnrichEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SourceEntry {
    Shorthand(String),
    Detailed(SourceEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SourceEntryObject {
    pub kind: SourceKind,
    pub path: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EnrichEntry {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EnrichSettings {
    pub enabled: bool,
    pub options: EnrichOptions,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub sources: Vec<SourceSpecifier>,
    pub media_ingredients: Option<Utf8PathBuf>,
    pub output_dir: Utf8PathBuf,
    pub graph_name: String,
    pub enrich: EnrichSettings,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KgError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(KgError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KgError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KgError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KgError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let sources = config
            .sources
            .into_iter()
            .map(|entry| match entry {
                SourceEntry::Shorthand(value) => value.parse(),
                SourceEntry::Detailed(obj) => {
                    if obj.path.trim().is_empty() {
                        return Err(KgError::InvalidSourceSpecifier(format!("{}:", obj.kind)));
                    }
                    Ok(SourceSpecifier {
                        kind: obj.kind,
                        path: Utf8PathBuf::from(obj.path.trim()),
                    })
                }
            })
            .collect::<Result<Vec<_>, KgError>>()?;

        let media_ingredients = config
            .media_ingredients
            .filter(|path| !path.trim().is_empty())
            .map(|path| Utf8PathBuf::from(path.trim()));

        let enrich = config.enrich.unwrap_or_default();
        let enrich = EnrichSettings {
            enabled: enrich.enabled,
            options: EnrichOptions {
                delay: Duration::from_millis(enrich.delay_ms.unwrap_or(DEFAULT_ENRICH_DELAY_MS)),
                limit: enrich.limit,
            },
        };

        Ok(ResolvedConfig {
            schema_version,
            sources,
            media_ingredients,
            output_dir: Utf8PathBuf::from(
                config
                    .output_dir
                    .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            graph_name: config
                .graph_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GRAPH_NAME.to_string()),
            enrich,
        })
    }
}
