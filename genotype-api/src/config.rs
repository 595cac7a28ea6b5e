use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use strum::{Display, EnumString};

use crate::domain::search::{Collections, InvalidMapping, NameMappings, Schema, SearchConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("Unknown APP_ENVIRONMENT: {0}")]
    UnknownEnvironment(String),

    #[error("Could not determine the current directory: {0}")]
    CurrentDir(#[from] std::io::Error),

    #[error("genotypes.{0} must name a collection")]
    MissingCollection(&'static str),

    #[error("genotypes.query_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("genotypes.name_mappings: {0}")]
    InvalidNameMapping(#[from] InvalidMapping),
}

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub genotypes: GenotypeSettings,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct GenotypeSettings {
    pub populations_collection: String,
    pub varieties_collection: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    /// Marker name to display name.
    #[serde(default)]
    pub name_mappings: HashMap<String, String>,
}

fn default_query_timeout_secs() -> u64 {
    30
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

impl GenotypeSettings {
    pub fn search_config(&self) -> Result<SearchConfig, ConfigurationError> {
        if self.populations_collection.trim().is_empty() {
            return Err(ConfigurationError::MissingCollection("populations_collection"));
        }
        if self.varieties_collection.trim().is_empty() {
            return Err(ConfigurationError::MissingCollection("varieties_collection"));
        }
        if self.query_timeout_secs == 0 {
            return Err(ConfigurationError::ZeroTimeout);
        }

        Ok(SearchConfig {
            collections: Collections {
                populations: self.populations_collection.clone(),
                varieties: self.varieties_collection.clone(),
            },
            query_timeout: Duration::from_secs(self.query_timeout_secs),
        })
    }

    /// Marker display names, checked against the record fields of `schema`.
    pub fn name_mappings(&self, schema: &Schema) -> Result<NameMappings, ConfigurationError> {
        let mappings = NameMappings::new(self.name_mappings.clone());
        mappings.validate(schema)?;
        Ok(mappings)
    }
}

pub fn read_config() -> Result<Settings, ConfigurationError> {
    let base_path = std::env::current_dir()?;
    let config_directory = base_path.join("config");

    let environment_name = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".into());
    let environment = Environment::from_str(&environment_name)
        .map_err(|_| ConfigurationError::UnknownEnvironment(environment_name.clone()))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("GENOTYPE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<Settings>()?)
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
