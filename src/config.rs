//! Router configuration loaded from YAML.
//!
//! ```yaml
//! weather:
//!   rain: 3.0
//!   snow: 8.0
//! search:
//!   max_expansions: 50000
//!   default_alternatives: 2
//! profiles:
//!   - id: stroller
//!     name: stroller
//!     modifiers:
//!       - condition: { field: hasSteps, op: "===", value: true }
//!         multiplier: .inf
//! ```
//!
//! Every section is optional. Profiles are merged over the built-ins; a
//! profile with a built-in's name replaces it.

use crate::cost::{ProfileCatalog, RoutingProfile, WeatherFactors};
use crate::routing::{RouteOptions, Router};
use nav_types::Graph;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IO_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Invalid(_) => "INVALID_CONFIG",
        }
    }
}

/// Search defaults applied when a request does not set them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_expansions: Option<usize>,
    pub default_alternatives: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub weather: WeatherFactors,
    pub search: SearchConfig,
    /// Extra or replacement routing profiles.
    pub profiles: Vec<RoutingProfile>,
}

impl RouterConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        tracing::info!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "router config loaded"
        );
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document is an empty config.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, factor) in [("rain", self.weather.rain), ("snow", self.weather.snow)] {
            if !factor.is_finite() || factor < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "weather factor '{name}' must be a finite non-negative number, got {factor}"
                )));
            }
        }
        if let Some(profile) = self.profiles.iter().find(|p| p.name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "profile '{}' has an empty name",
                profile.id
            )));
        }
        Ok(())
    }

    /// Built-in profiles overlaid with the configured ones.
    pub fn catalog(&self) -> ProfileCatalog {
        let mut catalog = ProfileCatalog::with_builtins();
        for profile in &self.profiles {
            catalog.insert(profile.clone());
        }
        catalog
    }

    /// Request options seeded from the search section.
    pub fn route_options(&self) -> RouteOptions {
        RouteOptions {
            alternatives: self.search.default_alternatives,
            max_expansions: self.search.max_expansions,
            cancel: None,
        }
    }

    /// A router over `graph` using the configured weather factors.
    pub fn router<'g>(&self, graph: &'g Graph) -> Router<'g> {
        Router::new(graph).with_weather_factors(self.weather)
    }
}
