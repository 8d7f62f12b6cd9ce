use std::str::FromStr as _;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing_subscriber::filter::{Directive, EnvFilter};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use wiring::StdError;

use crate::{Config, ConfigSection};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TracingConfig {
    #[serde(
        serialize_with = "serialize_level",
        deserialize_with = "deserialize_level",
        default = "default_level"
    )]
    pub level: tracing::Level,
    #[serde(default)]
    pub directives: Vec<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directives: Default::default(),
        }
    }
}

impl ConfigSection for TracingConfig {
    fn key() -> &'static str {
        "tracing"
    }
}

impl TracingConfig {
    /// Builds the filter for this config: every directive plus the default level.
    pub fn env_filter(&self) -> Result<EnvFilter, StdError> {
        let mut directives = Vec::new();
        for directive in &self.directives {
            directives.push(directive.parse::<Directive>().map_err(Box::new)?);
        }
        Ok(new_env_filter(&directives, self.level))
    }
}

/// Installs the global tracing subscriber with a fmt layer.
///
/// Fails if a directive cannot be parsed or a global subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<(), StdError> {
    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(tracing_subscriber::fmt::Layer::default())
        .try_init()?;
    Ok(())
}

/// Installs the global tracing subscriber if the config has a `tracing`
/// section. Returns whether a subscriber was installed.
pub fn init_tracing_from_config(config: &Config) -> Result<bool, StdError> {
    match config.section::<TracingConfig>()? {
        Some(tracing_config) => {
            init_tracing(&tracing_config)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn new_env_filter(directives: &[Directive], level: tracing::Level) -> EnvFilter {
    let mut filter = EnvFilter::default();
    for directive in directives {
        filter = filter.add_directive(directive.clone());
    }
    filter.add_directive(level.into())
}

fn serialize_level<S>(v: &tracing::Level, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(v.as_str())
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<tracing::Level, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    String::deserialize(deserializer)
        .and_then(|v| tracing::Level::from_str(&v).map_err(|v| Error::custom(format!("{v}"))))
}

fn default_level() -> tracing::Level {
    tracing::Level::DEBUG
}
