//! Validation reports

use causeway_core::{Issue, IssueCode, Severity};
use serde::{Deserialize, Serialize};

/// Result of the tiered validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when no error-severity issue was found
    pub valid: bool,
    pub errors: Vec<Issue>,
    /// Non-blocking findings
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    /// Build a report, partitioning issues by severity.
    pub fn from_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let (errors, warnings): (Vec<Issue>, Vec<Issue>) =
            issues.into_iter().partition(|issue| issue.severity == Severity::Error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Errors followed by warnings.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues().any(|issue| issue.code == code)
    }

    pub fn issues_with_code(&self, code: IssueCode) -> Vec<&Issue> {
        self.issues().filter(|issue| issue.code == code).collect()
    }

    /// Distinct error codes in first-seen order.
    pub fn error_codes(&self) -> Vec<IssueCode> {
        let mut codes = Vec::new();
        for issue in &self.errors {
            if !codes.contains(&issue.code) {
                codes.push(issue.code);
            }
        }
        codes
    }
}

/// Result of the post-normalisation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostNormalisationReport {
    pub valid: bool,
    pub errors: Vec<Issue>,
}

impl PostNormalisationReport {
    pub fn from_errors(errors: Vec<Issue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_by_severity() {
        let report = ValidationReport::from_issues(vec![
            Issue::new(IssueCode::LowEdgeConfidence, "edges[0]", "low"),
            Issue::new(IssueCode::MissingGoal, "nodes", "no goal"),
            Issue::new(IssueCode::MissingGoal, "nodes", "no goal again"),
        ]);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.error_codes(), vec![IssueCode::MissingGoal]);
        assert!(report.has_code(IssueCode::LowEdgeConfidence));
    }

    #[test]
    fn test_warnings_only_is_valid() {
        let report = ValidationReport::from_issues(vec![Issue::new(
            IssueCode::StrengthOutOfRange,
            "edges[1].strength_mean",
            "too strong",
        )]);
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }
}
