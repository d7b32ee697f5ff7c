//! Typed edge conditions.
//!
//! A condition compares one edge field against a literal. The set of fields
//! is closed, so a profile can never refer to a field that does not exist.

use nav_types::Edge;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Edge attribute a condition can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeField {
    Distance,
    Width,
    HasSteps,
    IsOutdoor,
    IsVertical,
    Direction,
    /// Membership in the edge's tag list.
    Tag,
}

impl EdgeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeField::Distance => "distance",
            EdgeField::Width => "width",
            EdgeField::HasSteps => "hasSteps",
            EdgeField::IsOutdoor => "isOutdoor",
            EdgeField::IsVertical => "isVertical",
            EdgeField::Direction => "direction",
            EdgeField::Tag => "tag",
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "===", alias = "==")]
    Eq,
    #[serde(rename = "!=", alias = "!==")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "===",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }

    /// Apply to an ordering result. `None` (incomparable) never matches.
    fn accepts(&self, ordering: Option<Ordering>) -> bool {
        let Some(ordering) = ordering else {
            return false;
        };
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }

    fn is_equality(&self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed literal on the right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Text(s) => write!(f, "'{s}'"),
        }
    }
}

/// `field op value`, e.g. `hasSteps === true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: EdgeField,
    pub op: CompareOp,
    pub value: Literal,
}

impl Condition {
    pub fn new(field: EdgeField, op: CompareOp, value: Literal) -> Self {
        Self { field, op, value }
    }

    /// `field === true`.
    pub fn is_true(field: EdgeField) -> Self {
        Self::new(field, CompareOp::Eq, Literal::Bool(true))
    }

    /// `tag === name`.
    pub fn has_tag(tag: impl Into<String>) -> Self {
        Self::new(EdgeField::Tag, CompareOp::Eq, Literal::Text(tag.into()))
    }

    /// Evaluate against an edge. Absent fields and literal type mismatches
    /// never match.
    pub fn matches(&self, edge: &Edge) -> bool {
        match self.field {
            EdgeField::Distance => self.compare_number(edge.distance),
            EdgeField::Width => self.compare_number(edge.width),
            EdgeField::HasSteps => self.compare_bool(edge.has_steps),
            EdgeField::IsOutdoor => self.compare_bool(edge.is_outdoor),
            EdgeField::IsVertical => self.compare_bool(edge.is_vertical),
            EdgeField::Direction => {
                self.compare_text(edge.direction.map(|d| d.as_str()))
            }
            EdgeField::Tag => self.compare_tag(edge),
        }
    }

    fn compare_number(&self, actual: Option<f64>) -> bool {
        match (actual, &self.value) {
            (Some(actual), Literal::Number(expected)) => {
                self.op.accepts(actual.partial_cmp(expected))
            }
            _ => false,
        }
    }

    fn compare_bool(&self, actual: Option<bool>) -> bool {
        match (actual, &self.value) {
            (Some(actual), Literal::Bool(expected)) if self.op.is_equality() => {
                self.op.accepts(Some(actual.cmp(expected)))
            }
            _ => false,
        }
    }

    fn compare_text(&self, actual: Option<&str>) -> bool {
        match (actual, &self.value) {
            (Some(actual), Literal::Text(expected)) if self.op.is_equality() => {
                self.op.accepts(Some(actual.cmp(expected.as_str())))
            }
            _ => false,
        }
    }

    fn compare_tag(&self, edge: &Edge) -> bool {
        let Literal::Text(tag) = &self.value else {
            return false;
        };
        if edge.tags.is_none() {
            return false;
        }
        match self.op {
            CompareOp::Eq => edge.has_tag(tag),
            CompareOp::Ne => !edge.has_tag(tag),
            _ => false,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field.as_str(), self.op, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_types::EdgeDirection;

    fn edge() -> Edge {
        Edge::new("e", "a", "b")
            .with_distance(12.0)
            .with_width(0.8)
            .with_steps(true)
            .with_direction(EdgeDirection::Forward)
            .with_tag("ramp")
    }

    #[test]
    fn numeric_comparisons() {
        let e = edge();
        let lt = |n| Condition::new(EdgeField::Width, CompareOp::Lt, Literal::Number(n));
        assert!(lt(1.0).matches(&e));
        assert!(!lt(0.8).matches(&e));
        assert!(Condition::new(EdgeField::Width, CompareOp::Le, Literal::Number(0.8)).matches(&e));
        assert!(Condition::new(EdgeField::Distance, CompareOp::Ge, Literal::Number(12.0)).matches(&e));
        assert!(Condition::new(EdgeField::Distance, CompareOp::Ne, Literal::Number(3.0)).matches(&e));
    }

    #[test]
    fn absent_field_never_matches() {
        let bare = Edge::new("e", "a", "b");
        assert!(!Condition::is_true(EdgeField::HasSteps).matches(&bare));
        assert!(!Condition::new(EdgeField::HasSteps, CompareOp::Ne, Literal::Bool(true)).matches(&bare));
        assert!(!Condition::new(EdgeField::Width, CompareOp::Lt, Literal::Number(100.0)).matches(&bare));
        assert!(!Condition::new(EdgeField::Tag, CompareOp::Ne, Literal::Text("x".into())).matches(&bare));
    }

    #[test]
    fn type_mismatch_never_matches() {
        let e = edge();
        assert!(!Condition::new(EdgeField::HasSteps, CompareOp::Eq, Literal::Number(1.0)).matches(&e));
        assert!(!Condition::new(EdgeField::Width, CompareOp::Eq, Literal::Text("0.8".into())).matches(&e));
        // Ordering operators are not defined on booleans
        assert!(!Condition::new(EdgeField::HasSteps, CompareOp::Gt, Literal::Bool(false)).matches(&e));
    }

    #[test]
    fn direction_and_tags() {
        let e = edge();
        assert!(Condition::new(EdgeField::Direction, CompareOp::Eq, Literal::Text("forward".into())).matches(&e));
        assert!(Condition::has_tag("ramp").matches(&e));
        assert!(!Condition::has_tag("lift").matches(&e));
        assert!(Condition::new(EdgeField::Tag, CompareOp::Ne, Literal::Text("lift".into())).matches(&e));
    }

    #[test]
    fn parses_operator_symbols() {
        let c: Condition =
            serde_json::from_str(r#"{"field":"hasSteps","op":"===","value":true}"#).unwrap();
        assert_eq!(c, Condition::is_true(EdgeField::HasSteps));
        let c: Condition =
            serde_json::from_str(r#"{"field":"width","op":"<","value":1.0}"#).unwrap();
        assert_eq!(c.to_string(), "width < 1");
    }
}
