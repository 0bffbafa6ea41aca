//! Analysis report: ordered issues with machine-readable codes.

use serde::Serialize;
use std::fmt;

/// Severity of an analysis issue. Only errors invalidate a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Machine-readable issue codes, one per distinct check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    // Structural
    EmptyDefinitions,
    InvalidFieldType,
    EmptyRuleId,
    DuplicateRuleId,
    MissingWhen,
    MissingThen,
    MissingOptions,
    ConstraintOrder,
    InvalidPattern,
    MissingStatement,
    MissingLogicVersion,
    MissingEval,
    IdCollision,
    // References
    UndefinedReference,
    UnknownLogicVersion,
    UnknownTarget,
    UnknownInput,
    UnknownOperator,
    // Types
    ArithmeticTypeError,
    ComparisonTypeMixed,
    SetTypeMismatch,
    // Temporal
    ZeroLengthRange,
    OverlappingRanges,
    // Conflicts
    ConflictingWrites,
    // Cycles
    DerivedCycle,
    // Deprecation
    DeprecatedConstraint,
    // Caught internal failure
    InternalError,
}

impl IssueCode {
    /// The code's wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::EmptyDefinitions => "empty_definitions",
            IssueCode::InvalidFieldType => "invalid_field_type",
            IssueCode::EmptyRuleId => "empty_rule_id",
            IssueCode::DuplicateRuleId => "duplicate_rule_id",
            IssueCode::MissingWhen => "missing_when",
            IssueCode::MissingThen => "missing_then",
            IssueCode::MissingOptions => "missing_options",
            IssueCode::ConstraintOrder => "constraint_order",
            IssueCode::InvalidPattern => "invalid_pattern",
            IssueCode::MissingStatement => "missing_statement",
            IssueCode::MissingLogicVersion => "missing_logic_version",
            IssueCode::MissingEval => "missing_eval",
            IssueCode::IdCollision => "id_collision",
            IssueCode::UndefinedReference => "undefined_reference",
            IssueCode::UnknownLogicVersion => "unknown_logic_version",
            IssueCode::UnknownTarget => "unknown_target",
            IssueCode::UnknownInput => "unknown_input",
            IssueCode::UnknownOperator => "unknown_operator",
            IssueCode::ArithmeticTypeError => "arithmetic_type_error",
            IssueCode::ComparisonTypeMixed => "comparison_type_mixed",
            IssueCode::SetTypeMismatch => "set_type_mismatch",
            IssueCode::ZeroLengthRange => "zero_length_range",
            IssueCode::OverlappingRanges => "overlapping_ranges",
            IssueCode::ConflictingWrites => "conflicting_writes",
            IssueCode::DerivedCycle => "derived_cycle",
            IssueCode::DeprecatedConstraint => "deprecated_constraint",
            IssueCode::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single analysis finding.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: IssueCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// Dotted location within the document (e.g. `temporal_map[1]`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

impl Issue {
    pub fn error(code: IssueCode, message: impl Into<String>) -> Issue {
        Issue {
            severity: Severity::Error,
            code,
            field_id: None,
            rule_id: None,
            path: None,
            message: message.into(),
        }
    }

    pub fn warning(code: IssueCode, message: impl Into<String>) -> Issue {
        Issue {
            severity: Severity::Warning,
            ..Issue::error(code, message)
        }
    }

    pub fn with_field(mut self, field_id: impl Into<String>) -> Issue {
        self.field_id = Some(field_id.into());
        self
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Issue {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Issue {
        self.path = Some(path.into());
        self
    }
}

/// Ordered result of a full analysis pass. A document is valid iff no
/// error-severity issues were found; warnings never invalidate.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub valid: bool,
    pub issues: Vec<Issue>,
}

impl AnalysisReport {
    pub fn new() -> AnalysisReport {
        AnalysisReport {
            valid: true,
            issues: Vec::new(),
        }
    }

    pub fn push(&mut self, issue: Issue) {
        if issue.severity == Severity::Error {
            self.valid = false;
        }
        self.issues.push(issue);
    }

    /// Issues filtered by severity.
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }
}

impl Default for AnalysisReport {
    fn default() -> Self {
        AnalysisReport::new()
    }
}
