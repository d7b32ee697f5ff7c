//! Validation report types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rule that produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleId {
    /// Edge endpoint missing.
    #[serde(rename = "ER-1")]
    EdgeReference,
    /// Edge connects a node to itself.
    #[serde(rename = "SL-1")]
    SelfLoop,
    /// More than one edge between the same unordered node pair.
    #[serde(rename = "DE-1")]
    DuplicateEdge,
    /// Node referenced by no edge.
    #[serde(rename = "NI-1")]
    IsolatedNode,
    /// Vertical connector without any vertical link or edge.
    #[serde(rename = "VL-1")]
    UnlinkedConnector,
    /// Vertical link pointing at a missing node.
    #[serde(rename = "VL-2")]
    BrokenVerticalLink,
    /// Space polygon crosses itself.
    #[serde(rename = "SI-1")]
    SelfIntersection,
    /// Reference to a missing floor or building.
    #[serde(rename = "RF-1")]
    DanglingReference,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::EdgeReference => "ER-1",
            RuleId::SelfLoop => "SL-1",
            RuleId::DuplicateEdge => "DE-1",
            RuleId::IsolatedNode => "NI-1",
            RuleId::UnlinkedConnector => "VL-1",
            RuleId::BrokenVerticalLink => "VL-2",
            RuleId::SelfIntersection => "SI-1",
            RuleId::DanglingReference => "RF-1",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RuleId::EdgeReference
            | RuleId::SelfLoop
            | RuleId::IsolatedNode
            | RuleId::SelfIntersection => Severity::Error,
            RuleId::DuplicateEdge
            | RuleId::UnlinkedConnector
            | RuleId::BrokenVerticalLink
            | RuleId::DanglingReference => Severity::Warning,
        }
    }

    pub fn policy(&self) -> Policy {
        match self {
            RuleId::EdgeReference | RuleId::DanglingReference => Policy::ReferentialIntegrity,
            RuleId::SelfLoop | RuleId::DuplicateEdge => Policy::GraphSimplicity,
            RuleId::IsolatedNode => Policy::Connectivity,
            RuleId::UnlinkedConnector | RuleId::BrokenVerticalLink => Policy::VerticalContinuity,
            RuleId::SelfIntersection => Policy::GeometricValidity,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocking.
    Error,
    /// Advisory.
    Warning,
}

/// Design principle a rule protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    ReferentialIntegrity,
    GraphSimplicity,
    Connectivity,
    VerticalContinuity,
    GeometricValidity,
}

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub rule_id: RuleId,
    pub severity: Severity,
    pub message: String,
    pub target_ids: Vec<String>,
    pub policy: Policy,
}

impl ValidationIssue {
    /// Severity and policy follow from the rule.
    pub fn new<I, S>(rule: RuleId, message: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            rule_id: rule,
            severity: rule.severity(),
            message: message.into(),
            target_ids: targets.into_iter().map(|t| t.to_string()).collect(),
            policy: rule.policy(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{}] {level}: {}", self.rule_id, self.message)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub errors: usize,
    pub warnings: usize,
}

/// Result of scanning a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// No error-severity issue was found.
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let errors = issues.iter().filter(|i| i.is_error()).count();
        let summary = ValidationSummary {
            errors,
            warnings: issues.len() - errors,
        };
        Self {
            is_valid: errors == 0,
            issues,
            summary,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// Issues raised by one rule.
    pub fn by_rule(&self, rule: RuleId) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.rule_id == rule)
    }

    /// Turn the advisory report into a blocking check.
    pub fn ensure_valid(self) -> Result<Self, ValidationFailed> {
        if self.is_valid {
            return Ok(self);
        }
        Err(ValidationFailed {
            errors: self.errors().cloned().collect(),
        })
    }
}

/// Blocking validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("graph failed validation with {} error(s): {}", errors.len(), format_issues(errors))]
pub struct ValidationFailed {
    pub errors: Vec<ValidationIssue>,
}

impl ValidationFailed {
    pub fn code(&self) -> &'static str {
        "VALIDATION_FAILED"
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
