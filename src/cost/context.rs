//! Environmental context applied uniformly across one search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Weather at the time of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Snow,
}

impl Weather {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Rain => "rain",
            Weather::Snow => "snow",
        }
    }

    /// Weather that penalizes outdoor edges.
    pub fn is_adverse(&self) -> bool {
        !matches!(self, Weather::Clear)
    }
}

impl std::str::FromStr for Weather {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clear" => Ok(Weather::Clear),
            "rain" => Ok(Weather::Rain),
            "snow" => Ok(Weather::Snow),
            other => Err(format!("unknown weather '{other}' (expected clear, rain or snow)")),
        }
    }
}

/// Multipliers applied to outdoor edges under adverse weather.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherFactors {
    pub rain: f64,
    pub snow: f64,
}

impl Default for WeatherFactors {
    fn default() -> Self {
        Self {
            rain: 3.0,
            snow: 8.0,
        }
    }
}

impl WeatherFactors {
    /// Factor for an outdoor edge under `weather`.
    pub fn factor(&self, weather: Weather) -> f64 {
        match weather {
            Weather::Clear => 1.0,
            Weather::Rain => self.rain,
            Weather::Snow => self.snow,
        }
    }
}

/// Conditions for one routing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteContext {
    #[serde(default)]
    pub weather: Weather,
    /// Time of travel, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// Free-form caller flags.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<String>,
}

impl RouteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set weather.
    #[must_use]
    pub fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }

    /// Builder: set travel time.
    #[must_use]
    pub fn at_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Builder: add a flag.
    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_parsing() {
        assert_eq!("Rain".parse::<Weather>(), Ok(Weather::Rain));
        assert_eq!("snow".parse::<Weather>(), Ok(Weather::Snow));
        assert!("hail".parse::<Weather>().is_err());
    }

    #[test]
    fn default_factors() {
        let f = WeatherFactors::default();
        assert_eq!(f.factor(Weather::Clear), 1.0);
        assert_eq!(f.factor(Weather::Rain), 3.0);
        assert_eq!(f.factor(Weather::Snow), 8.0);
        assert!(!Weather::Clear.is_adverse());
        assert!(Weather::Snow.is_adverse());
    }

    #[test]
    fn context_deserializes_from_partial_json() {
        let ctx: RouteContext = serde_json::from_str(r#"{"weather":"rain"}"#).unwrap();
        assert_eq!(ctx.weather, Weather::Rain);
        assert!(ctx.flags.is_empty());
        assert!(ctx.time.is_none());
    }
}
