//! Cost function framework.
//!
//! Turns an edge, a [`RoutingProfile`] and a [`RouteContext`] into one
//! scalar traversal cost, or "impassable" (`f64::INFINITY`).
//!
//! ```text
//! base = distance (1.0 when absent)
//!   │
//!   ▼ for each matching modifier, in order
//! cost = cost * multiplier + additive     (∞ multiplier: impassable, stop)
//!   │
//!   ▼ outdoor edge under rain/snow
//! cost *= weather factor
//!   │
//!   ▼
//! max(cost, 0)
//! ```

mod condition;
mod context;
mod profile;

pub use condition::{CompareOp, Condition, EdgeField, Literal};
pub use context::{RouteContext, Weather, WeatherFactors};
pub use profile::{CostModifier, ProfileCatalog, RoutingProfile, CART_MIN_WIDTH};

use nav_types::Edge;

/// Cost of an edge without a distance.
pub const DEFAULT_BASE_COST: f64 = 1.0;

/// Evaluates edge costs for one search.
#[derive(Debug, Clone, Copy)]
pub struct CostEvaluator<'a> {
    profile: &'a RoutingProfile,
    context: &'a RouteContext,
    weather: WeatherFactors,
}

impl<'a> CostEvaluator<'a> {
    pub fn new(profile: &'a RoutingProfile, context: &'a RouteContext) -> Self {
        Self {
            profile,
            context,
            weather: WeatherFactors::default(),
        }
    }

    /// Override the default weather factors.
    #[must_use]
    pub fn with_weather_factors(mut self, factors: WeatherFactors) -> Self {
        self.weather = factors;
        self
    }

    pub fn profile(&self) -> &'a RoutingProfile {
        self.profile
    }

    /// Traversal cost of `edge`. `f64::INFINITY` means impassable.
    pub fn edge_cost(&self, edge: &Edge) -> f64 {
        let mut cost = edge.distance.unwrap_or(DEFAULT_BASE_COST);

        for modifier in &self.profile.modifiers {
            if !modifier.condition.matches(edge) {
                continue;
            }
            if modifier.is_blocking() {
                return f64::INFINITY;
            }
            cost = cost * modifier.multiplier + modifier.additive;
        }

        if edge.is_outdoor == Some(true) && self.context.weather.is_adverse() {
            cost *= self.weather.factor(self.context.weather);
        }

        if cost.is_nan() {
            return f64::INFINITY;
        }
        cost.max(0.0)
    }

    pub fn is_passable(&self, edge: &Edge) -> bool {
        self.edge_cost(edge).is_finite()
    }

    /// Multiplier for the straight-line heuristic; see
    /// [`RoutingProfile::heuristic_scale`].
    pub fn heuristic_scale(&self) -> f64 {
        self.profile.heuristic_scale()
    }
}

/// Cost of one edge under default weather factors.
pub fn edge_cost(edge: &Edge, profile: &RoutingProfile, context: &RouteContext) -> f64 {
    CostEvaluator::new(profile, context).edge_cost(edge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(weather: Weather) -> RouteContext {
        RouteContext::new().with_weather(weather)
    }

    #[test]
    fn base_cost_is_distance_or_one() {
        let clear = ctx(Weather::Clear);
        let profile = RoutingProfile::default_profile();
        assert_eq!(edge_cost(&Edge::new("e", "a", "b").with_distance(7.5), &profile, &clear), 7.5);
        assert_eq!(edge_cost(&Edge::new("e", "a", "b"), &profile, &clear), 1.0);
    }

    #[test]
    fn steps_block_cart_and_accessible() {
        let clear = ctx(Weather::Clear);
        let stairs = Edge::new("e", "a", "b").with_distance(4.0).with_steps(true);
        assert!(edge_cost(&stairs, &RoutingProfile::cart(), &clear).is_infinite());
        assert!(edge_cost(&stairs, &RoutingProfile::accessible(), &clear).is_infinite());
        assert_eq!(edge_cost(&stairs, &RoutingProfile::default_profile(), &clear), 4.0);
    }

    #[test]
    fn impassable_is_irreversible() {
        let profile = RoutingProfile::new("p", "p")
            .with_modifier(CostModifier::forbid(Condition::is_true(EdgeField::HasSteps)))
            .with_modifier(CostModifier::multiply(Condition::is_true(EdgeField::HasSteps), 0.0));
        let stairs = Edge::new("e", "a", "b").with_steps(true);
        assert!(edge_cost(&stairs, &profile, &ctx(Weather::Clear)).is_infinite());
    }

    #[test]
    fn modifiers_compose_in_order() {
        let profile = RoutingProfile::new("p", "p")
            .with_modifier(CostModifier::multiply(Condition::has_tag("slow"), 2.0))
            .with_modifier(CostModifier::add(Condition::has_tag("slow"), 3.0));
        let e = Edge::new("e", "a", "b").with_distance(5.0).with_tag("slow");
        assert_eq!(edge_cost(&e, &profile, &ctx(Weather::Clear)), 13.0);
    }

    #[test]
    fn weather_only_affects_outdoor_edges() {
        let profile = RoutingProfile::default_profile();
        let outside = Edge::new("e", "a", "b").with_distance(10.0).outdoor(true);
        let inside = Edge::new("e", "a", "b").with_distance(10.0).outdoor(false);

        assert_eq!(edge_cost(&outside, &profile, &ctx(Weather::Clear)), 10.0);
        assert_eq!(edge_cost(&outside, &profile, &ctx(Weather::Rain)), 30.0);
        assert_eq!(edge_cost(&outside, &profile, &ctx(Weather::Snow)), 80.0);
        assert_eq!(edge_cost(&inside, &profile, &ctx(Weather::Snow)), 10.0);

        let custom = WeatherFactors { rain: 2.0, snow: 4.0 };
        let snow = ctx(Weather::Snow);
        let eval = CostEvaluator::new(&profile, &snow).with_weather_factors(custom);
        assert_eq!(eval.edge_cost(&outside), 40.0);
    }

    #[test]
    fn rain_profile_stacks_with_weather() {
        let outside = Edge::new("e", "a", "b").with_distance(2.0).outdoor(true);
        assert_eq!(edge_cost(&outside, &RoutingProfile::rain(), &ctx(Weather::Rain)), 30.0);
    }

    #[test]
    fn cost_is_clamped_non_negative() {
        let profile = RoutingProfile::new("p", "p")
            .with_modifier(CostModifier::add(Condition::has_tag("free"), -100.0));
        let e = Edge::new("e", "a", "b").with_distance(5.0).with_tag("free");
        assert_eq!(edge_cost(&e, &profile, &ctx(Weather::Clear)), 0.0);
    }

    #[test]
    fn narrow_passage_for_carts() {
        let narrow = Edge::new("e", "a", "b").with_distance(3.0).with_width(0.7);
        let wide = Edge::new("e", "a", "b").with_distance(3.0).with_width(1.5);
        let clear = ctx(Weather::Clear);
        assert_eq!(edge_cost(&narrow, &RoutingProfile::cart(), &clear), 30.0);
        assert_eq!(edge_cost(&wide, &RoutingProfile::cart(), &clear), 3.0);
    }
}
