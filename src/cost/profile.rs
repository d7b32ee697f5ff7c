//! Routing profiles: named lists of cost modifiers.

use super::condition::{CompareOp, Condition, EdgeField, Literal};
use nav_types::ProfileId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Width below which a cart cannot pass comfortably.
pub const CART_MIN_WIDTH: f64 = 1.0;

/// One declarative cost adjustment: when `condition` matches,
/// `cost = cost * multiplier + additive`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostModifier {
    pub condition: Condition,
    /// `f64::INFINITY` makes a matching edge impassable.
    #[serde(default = "unit_multiplier", with = "factor")]
    pub multiplier: f64,
    #[serde(default)]
    pub additive: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn unit_multiplier() -> f64 {
    1.0
}

impl CostModifier {
    pub fn multiply(condition: Condition, multiplier: f64) -> Self {
        Self {
            condition,
            multiplier,
            additive: 0.0,
            description: None,
        }
    }

    /// Matching edges become impassable.
    pub fn forbid(condition: Condition) -> Self {
        Self::multiply(condition, f64::INFINITY)
    }

    pub fn add(condition: Condition, additive: f64) -> Self {
        Self {
            condition,
            multiplier: 1.0,
            additive,
            description: None,
        }
    }

    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.multiplier.is_infinite() && self.multiplier > 0.0
    }
}

/// Serde for multipliers: infinite values are written as `"Infinity"` so
/// the JSON stays valid. YAML's `.inf` parses as a plain float.
mod factor {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() && *value > 0.0 {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "infinity" | "+infinity" | "inf" | "+inf" | ".inf" => Ok(f64::INFINITY),
                other => other.parse::<f64>().map_err(|_| {
                    serde::de::Error::custom(format!("invalid multiplier '{s}'"))
                }),
            },
        }
    }
}

/// A named, ordered list of cost modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingProfile {
    pub id: ProfileId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<CostModifier>,
}

impl RoutingProfile {
    pub fn new(id: impl Into<ProfileId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            modifiers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: CostModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Factor bounding how far the profile can shrink an edge's cost below
    /// its distance. A* scales its straight-line heuristic by this.
    ///
    /// The smallest finite, non-negative multiplier capped at 1; 0 when any
    /// modifier can subtract cost.
    pub fn heuristic_scale(&self) -> f64 {
        if self.modifiers.iter().any(|m| m.additive < 0.0) {
            return 0.0;
        }
        self.modifiers
            .iter()
            .map(|m| m.multiplier)
            .filter(|m| m.is_finite())
            .fold(1.0_f64, |scale, m| scale.min(m.max(0.0)))
    }

    /// Distance only.
    pub fn default_profile() -> Self {
        Self::new("default", "default").described("Shortest distance")
    }

    /// Wheeled carts: no steps, narrow passages strongly discouraged.
    pub fn cart() -> Self {
        Self::new("cart", "cart")
            .described("Carts and trolleys")
            .with_modifier(
                CostModifier::forbid(Condition::is_true(EdgeField::HasSteps))
                    .described("Steps block carts"),
            )
            .with_modifier(
                CostModifier::multiply(
                    Condition::new(EdgeField::Width, CompareOp::Lt, Literal::Number(CART_MIN_WIDTH)),
                    10.0,
                )
                .described("Narrow passage"),
            )
    }

    /// Avoid outdoor stretches.
    pub fn rain() -> Self {
        Self::new("rain", "rain")
            .described("Stay indoors")
            .with_modifier(
                CostModifier::multiply(Condition::is_true(EdgeField::IsOutdoor), 5.0)
                    .described("Outdoor stretch"),
            )
    }

    /// Step-free routing that favors lifts.
    pub fn accessible() -> Self {
        Self::new("accessible", "accessible")
            .described("Step-free access")
            .with_modifier(
                CostModifier::forbid(Condition::is_true(EdgeField::HasSteps))
                    .described("Steps are not accessible"),
            )
            .with_modifier(
                CostModifier::multiply(Condition::is_true(EdgeField::IsVertical), 0.5)
                    .described("Prefer vertical connectors"),
            )
    }

    pub fn builtins() -> Vec<RoutingProfile> {
        vec![
            Self::default_profile(),
            Self::cart(),
            Self::rain(),
            Self::accessible(),
        ]
    }
}

impl Default for RoutingProfile {
    fn default() -> Self {
        Self::default_profile()
    }
}

/// Profiles addressable by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCatalog {
    profiles: BTreeMap<String, RoutingProfile>,
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ProfileCatalog {
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// Catalog holding the four built-in profiles.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::empty();
        for profile in RoutingProfile::builtins() {
            catalog.insert(profile);
        }
        catalog
    }

    /// Add or replace a profile by name.
    pub fn insert(&mut self, profile: RoutingProfile) -> Option<RoutingProfile> {
        self.profiles.insert(profile.name.clone(), profile)
    }

    pub fn get(&self, name: &str) -> Option<&RoutingProfile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutingProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn heuristic_scale_follows_discounts() {
        assert_eq!(RoutingProfile::default_profile().heuristic_scale(), 1.0);
        assert_eq!(RoutingProfile::cart().heuristic_scale(), 1.0);
        assert_eq!(RoutingProfile::accessible().heuristic_scale(), 0.5);

        let subtracting = RoutingProfile::new("p", "p")
            .with_modifier(CostModifier::add(Condition::has_tag("shortcut"), -2.0));
        assert_eq!(subtracting.heuristic_scale(), 0.0);
    }

    #[test]
    fn infinity_written_as_string_in_json() {
        let json = serde_json::to_value(RoutingProfile::cart()).unwrap();
        assert_eq!(json["modifiers"][0]["multiplier"], "Infinity");
        assert_eq!(json["modifiers"][1]["multiplier"], 10.0);

        let back: RoutingProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, RoutingProfile::cart());
    }

    #[test]
    fn modifier_defaults_when_parsing() {
        let m: CostModifier = serde_json::from_str(
            r#"{"condition":{"field":"isOutdoor","op":"===","value":true}}"#,
        )
        .unwrap();
        assert_eq!(m.multiplier, 1.0);
        assert_eq!(m.additive, 0.0);
    }

    #[test]
    fn yaml_infinity_forms() {
        let yaml = r#"
id: stroller
name: stroller
modifiers:
  - condition: { field: hasSteps, op: "===", value: true }
    multiplier: .inf
  - condition: { field: tag, op: "===", value: escalator }
    multiplier: Infinity
"#;
        let profile: RoutingProfile = serde_yaml::from_str(yaml).unwrap();
        assert!(profile.modifiers.iter().all(CostModifier::is_blocking));
    }

    #[test]
    fn catalog_lists_builtins_by_name() {
        let catalog = ProfileCatalog::with_builtins();
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["accessible", "cart", "default", "rain"]
        );
        assert!(catalog.get("cart").is_some());
        assert!(catalog.get("bike").is_none());
    }
}
