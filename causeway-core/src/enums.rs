//! Enum types for decision graph nodes and edges

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// LENIENT ENUM FIELDS
// ============================================================================

/// An enum-valued field that may arrive with a value outside its closed set.
///
/// Graphs are drafted by external collaborators, so a `factor_type` of
/// `"revenue-ish"` has to survive deserialization long enough for the
/// reconciliation pass to coerce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Known(T),
    Unknown(String),
}

impl<T: Copy> Lenient<T> {
    /// The known value, if the field is inside its enum.
    pub fn known(&self) -> Option<T> {
        match self {
            Lenient::Known(value) => Some(*value),
            Lenient::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Lenient::Known(_))
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Lenient::Known(value)
    }
}

impl<T: fmt::Display> fmt::Display for Lenient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lenient::Known(value) => write!(f, "{}", value),
            Lenient::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

fn normalize_token(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Error when parsing an enum value outside its closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

// ============================================================================
// NODE KIND
// ============================================================================

/// Kind discriminator of a decision graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Decision,
    Option,
    Factor,
    Outcome,
    Risk,
    Goal,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Decision,
        NodeKind::Option,
        NodeKind::Factor,
        NodeKind::Outcome,
        NodeKind::Risk,
        NodeKind::Goal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Decision => "decision",
            NodeKind::Option => "option",
            NodeKind::Factor => "factor",
            NodeKind::Outcome => "outcome",
            NodeKind::Risk => "risk",
            NodeKind::Goal => "goal",
        }
    }

    /// Outcome and risk nodes bridge factors to the goal.
    pub fn is_bridge(&self) -> bool {
        matches!(self, NodeKind::Outcome | NodeKind::Risk)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "decision" => Ok(NodeKind::Decision),
            "option" => Ok(NodeKind::Option),
            "factor" => Ok(NodeKind::Factor),
            "outcome" => Ok(NodeKind::Outcome),
            "risk" => Ok(NodeKind::Risk),
            "goal" => Ok(NodeKind::Goal),
            _ => Err(EnumParseError {
                kind: "node kind",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// FACTOR CATEGORY
// ============================================================================

/// Category of a factor node.
///
/// Always re-derivable from graph structure; a declared category is only a
/// claim until reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorCategory {
    /// Set directly by at least one option
    Controllable,
    /// Not user-settable but has a known baseline value
    Observable,
    /// Outside user control and without a known baseline
    External,
}

impl FactorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorCategory::Controllable => "controllable",
            FactorCategory::Observable => "observable",
            FactorCategory::External => "external",
        }
    }
}

impl fmt::Display for FactorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FactorCategory {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "controllable" => Ok(FactorCategory::Controllable),
            "observable" => Ok(FactorCategory::Observable),
            "external" => Ok(FactorCategory::External),
            _ => Err(EnumParseError {
                kind: "factor category",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// FACTOR DATA ENUMS
// ============================================================================

/// Semantic type of a controllable factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorType {
    Cost,
    Price,
    Time,
    Probability,
    Revenue,
    Demand,
    Quality,
    Other,
}

impl FactorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorType::Cost => "cost",
            FactorType::Price => "price",
            FactorType::Time => "time",
            FactorType::Probability => "probability",
            FactorType::Revenue => "revenue",
            FactorType::Demand => "demand",
            FactorType::Quality => "quality",
            FactorType::Other => "other",
        }
    }
}

impl Default for FactorType {
    fn default() -> Self {
        FactorType::Other
    }
}

impl fmt::Display for FactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FactorType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "cost" => Ok(FactorType::Cost),
            "price" => Ok(FactorType::Price),
            "time" => Ok(FactorType::Time),
            "probability" => Ok(FactorType::Probability),
            "revenue" => Ok(FactorType::Revenue),
            "demand" => Ok(FactorType::Demand),
            "quality" => Ok(FactorType::Quality),
            "other" => Ok(FactorType::Other),
            _ => Err(EnumParseError {
                kind: "factor type",
                value: s.to_string(),
            }),
        }
    }
}

/// How a factor's value was obtained from the brief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionType {
    /// Stated verbatim
    Explicit,
    /// Estimated from context
    Inferred,
    /// Given as a range and collapsed to a point
    Range,
}

impl ExtractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionType::Explicit => "explicit",
            ExtractionType::Inferred => "inferred",
            ExtractionType::Range => "range",
        }
    }
}

impl Default for ExtractionType {
    fn default() -> Self {
        ExtractionType::Inferred
    }
}

impl fmt::Display for ExtractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractionType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "explicit" => Ok(ExtractionType::Explicit),
            "inferred" => Ok(ExtractionType::Inferred),
            "range" => Ok(ExtractionType::Range),
            _ => Err(EnumParseError {
                kind: "extraction type",
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// EDGE ENUMS
// ============================================================================

/// Redundant sign annotation on an edge; must agree with `strength_mean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectDirection {
    Positive,
    Negative,
}

impl EffectDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectDirection::Positive => "positive",
            EffectDirection::Negative => "negative",
        }
    }

    /// Direction implied by a strength mean. `None` for zero or non-finite.
    pub fn from_mean(mean: f64) -> Option<Self> {
        if !mean.is_finite() || mean == 0.0 {
            None
        } else if mean > 0.0 {
            Some(EffectDirection::Positive)
        } else {
            Some(EffectDirection::Negative)
        }
    }
}

impl Default for EffectDirection {
    fn default() -> Self {
        EffectDirection::Positive
    }
}

impl fmt::Display for EffectDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EffectDirection {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "positive" => Ok(EffectDirection::Positive),
            "negative" => Ok(EffectDirection::Negative),
            _ => Err(EnumParseError {
                kind: "effect direction",
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_accepts_known_value() {
        let parsed: Lenient<FactorType> = serde_json::from_str("\"price\"").unwrap();
        assert_eq!(parsed, Lenient::Known(FactorType::Price));
        assert_eq!(parsed.known(), Some(FactorType::Price));
    }

    #[test]
    fn test_lenient_keeps_unknown_value() {
        let parsed: Lenient<EffectDirection> = serde_json::from_str("\"upward\"").unwrap();
        assert_eq!(parsed, Lenient::Unknown("upward".to_string()));
        assert!(!parsed.is_known());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"upward\"");
    }

    #[test]
    fn test_effect_direction_from_mean() {
        assert_eq!(EffectDirection::from_mean(0.4), Some(EffectDirection::Positive));
        assert_eq!(EffectDirection::from_mean(-0.1), Some(EffectDirection::Negative));
        assert_eq!(EffectDirection::from_mean(0.0), None);
        assert_eq!(EffectDirection::from_mean(f64::NAN), None);
    }

    #[test]
    fn test_node_kind_from_str_normalizes() {
        assert_eq!("  Goal ".parse::<NodeKind>().unwrap(), NodeKind::Goal);
        assert!("goals".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_factor_category_display_roundtrip() {
        for category in [
            FactorCategory::Controllable,
            FactorCategory::Observable,
            FactorCategory::External,
        ] {
            assert_eq!(category.to_string().parse::<FactorCategory>().unwrap(), category);
        }
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_from_mean_follows_sign(mean in prop::num::f64::NORMAL) {
            let expected = if mean > 0.0 {
                EffectDirection::Positive
            } else {
                EffectDirection::Negative
            };
            prop_assert_eq!(EffectDirection::from_mean(mean), Some(expected));
            prop_assert_ne!(EffectDirection::from_mean(-mean), Some(expected));
        }

        #[test]
        fn prop_unrecognised_direction_is_kept_verbatim(raw in "[a-z]{1,12}") {
            prop_assume!(raw != "positive" && raw != "negative");
            let parsed: Lenient<EffectDirection> =
                serde_json::from_value(serde_json::Value::String(raw.clone())).unwrap();
            prop_assert_eq!(parsed, Lenient::Unknown(raw));
        }
    }
}
