//! Decision graph data model
//!
//! A graph is a flat list of typed nodes and weighted edges. Node payloads are
//! shaped per kind: only options carry interventions and only factors carry a
//! category and factor data. Everything else is rejected at the type level.

use crate::{compute_content_hash, EffectDirection, ExtractionType, FactorCategory, FactorType, Lenient, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical `strength_mean` of a structural edge.
pub const STRUCTURAL_MEAN: f64 = 1.0;
/// Canonical `strength_std` of a structural edge.
pub const STRUCTURAL_STD: f64 = 0.01;
/// Canonical `belief_exists` of a structural edge.
pub const STRUCTURAL_BELIEF: f64 = 1.0;

const CANONICAL_TOLERANCE: f64 = 1e-9;

// ============================================================================
// NODE PAYLOADS
// ============================================================================

/// Payload of an option node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionData {
    /// Factor id to the value this option sets it to
    #[serde(default)]
    pub interventions: BTreeMap<String, f64>,
}

/// Payload of a factor node as it arrives from a drafting collaborator.
///
/// Which keys are allowed depends on the factor's category; see
/// [`crate::FactorPayload`] for the typed projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<f64>,
    #[serde(
        rename = "extractionType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub extraction_type: Option<Lenient<ExtractionType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor_type: Option<Lenient<FactorType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty_drivers: Option<Vec<String>>,
}

impl FactorData {
    /// Observable shape: a value and how it was extracted.
    pub fn observed(value: f64, extraction_type: ExtractionType) -> Self {
        Self {
            value: Some(value),
            extraction_type: Some(Lenient::Known(extraction_type)),
            ..Self::default()
        }
    }

    /// Controllable shape: the observable keys plus type and uncertainty drivers.
    pub fn controlled(
        value: f64,
        extraction_type: ExtractionType,
        factor_type: FactorType,
        uncertainty_drivers: Vec<String>,
    ) -> Self {
        Self {
            value: Some(value),
            baseline: None,
            extraction_type: Some(Lenient::Known(extraction_type)),
            factor_type: Some(Lenient::Known(factor_type)),
            uncertainty_drivers: Some(uncertainty_drivers),
        }
    }

    pub fn with_baseline(mut self, baseline: f64) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// A finite value, the structural signal for an observable factor.
    pub fn finite_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// Kind-specific body of a node, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeBody {
    Decision,
    Option {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<OptionData>,
    },
    Factor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<FactorCategory>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<FactorData>,
    },
    Outcome,
    Risk,
    Goal,
}

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeBody::Decision => NodeKind::Decision,
            NodeBody::Option { .. } => NodeKind::Option,
            NodeBody::Factor { .. } => NodeKind::Factor,
            NodeBody::Outcome => NodeKind::Outcome,
            NodeBody::Risk => NodeKind::Risk,
            NodeBody::Goal => NodeKind::Goal,
        }
    }
}

// ============================================================================
// NODE
// ============================================================================

/// A node in a decision graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub body: NodeBody,
}

impl Node {
    fn with_body(id: impl Into<String>, label: impl Into<String>, body: NodeBody) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            body,
        }
    }

    pub fn decision(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::with_body(id, label, NodeBody::Decision)
    }

    pub fn goal(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::with_body(id, label, NodeBody::Goal)
    }

    pub fn outcome(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::with_body(id, label, NodeBody::Outcome)
    }

    pub fn risk(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::with_body(id, label, NodeBody::Risk)
    }

    /// An option node setting the given interventions.
    pub fn option<I, K>(id: impl Into<String>, label: impl Into<String>, interventions: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let interventions = interventions
            .into_iter()
            .map(|(factor, value)| (factor.into(), value))
            .collect();
        Self::with_body(
            id,
            label,
            NodeBody::Option {
                data: Some(OptionData { interventions }),
            },
        )
    }

    /// A factor with no declared category and no data.
    pub fn factor(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::with_body(
            id,
            label,
            NodeBody::Factor {
                category: None,
                data: None,
            },
        )
    }

    /// Set the declared category. No-op on non-factor nodes.
    pub fn with_category(mut self, declared: FactorCategory) -> Self {
        if let NodeBody::Factor { category, .. } = &mut self.body {
            *category = Some(declared);
        }
        self
    }

    /// Set the factor data. No-op on non-factor nodes.
    pub fn with_factor_data(mut self, factor_data: FactorData) -> Self {
        if let NodeBody::Factor { data, .. } = &mut self.body {
            *data = Some(factor_data);
        }
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    pub fn is_factor(&self) -> bool {
        matches!(self.body, NodeBody::Factor { .. })
    }

    /// Declared category of a factor, `None` for absent or non-factor.
    pub fn declared_category(&self) -> Option<FactorCategory> {
        match &self.body {
            NodeBody::Factor { category, .. } => *category,
            _ => None,
        }
    }

    pub fn factor_data(&self) -> Option<&FactorData> {
        match &self.body {
            NodeBody::Factor { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    /// Interventions of an option node. Empty for options without data.
    pub fn interventions(&self) -> Option<&BTreeMap<String, f64>> {
        match &self.body {
            NodeBody::Option { data } => data.as_ref().map(|d| &d.interventions),
            _ => None,
        }
    }
}

// ============================================================================
// EDGE
// ============================================================================

/// A directed, weighted edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Signed causal direction and magnitude
    pub strength_mean: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength_std: Option<f64>,
    /// Existence confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belief_exists: Option<f64>,
    /// Legacy name for `belief_exists`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belief: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_direction: Option<Lenient<EffectDirection>>,
}

impl Edge {
    /// A bare edge carrying only a mean.
    pub fn new(from: impl Into<String>, to: impl Into<String>, strength_mean: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            strength_mean,
            strength_std: None,
            belief_exists: None,
            belief: None,
            effect_direction: None,
        }
    }

    /// A causal edge with direction derived from the mean.
    pub fn causal(
        from: impl Into<String>,
        to: impl Into<String>,
        strength_mean: f64,
        strength_std: f64,
        belief_exists: f64,
    ) -> Self {
        let mut edge = Self::new(from, to, strength_mean);
        edge.strength_std = Some(strength_std);
        edge.belief_exists = Some(belief_exists);
        edge.effect_direction = EffectDirection::from_mean(strength_mean).map(Lenient::Known);
        edge
    }

    /// A structural edge carrying the canonical scaffolding constants.
    pub fn structural(from: impl Into<String>, to: impl Into<String>) -> Self {
        let mut edge = Self::new(from, to, STRUCTURAL_MEAN);
        edge.strength_std = Some(STRUCTURAL_STD);
        edge.belief_exists = Some(STRUCTURAL_BELIEF);
        edge.effect_direction = Some(Lenient::Known(EffectDirection::Positive));
        edge
    }

    pub fn with_std(mut self, std: f64) -> Self {
        self.strength_std = Some(std);
        self
    }

    pub fn with_belief(mut self, belief: f64) -> Self {
        self.belief_exists = Some(belief);
        self
    }

    pub fn with_direction(mut self, direction: Lenient<EffectDirection>) -> Self {
        self.effect_direction = Some(direction);
        self
    }

    /// `belief_exists`, falling back to the legacy `belief` field.
    pub fn effective_belief(&self) -> Option<f64> {
        self.belief_exists.or(self.belief)
    }

    /// Whether this edge carries exactly the canonical scaffolding quadruple.
    ///
    /// An absent std, belief, or direction is a deviation.
    pub fn is_canonical_structural(&self) -> bool {
        let close = |value: Option<f64>, expected: f64| {
            value.is_some_and(|v| (v - expected).abs() <= CANONICAL_TOLERANCE)
        };
        close(Some(self.strength_mean), STRUCTURAL_MEAN)
            && close(self.strength_std, STRUCTURAL_STD)
            && close(self.effective_belief(), STRUCTURAL_BELIEF)
            && matches!(
                self.effect_direction,
                Some(Lenient::Known(EffectDirection::Positive))
            )
    }
}

// ============================================================================
// GRAPH
// ============================================================================

/// A causal decision graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            meta: serde_json::Map::new(),
        }
    }

    /// Hex SHA-256 over the JSON serialization.
    ///
    /// Non-finite numbers serialize as `null`, so two graphs differing only in
    /// which non-finite value they hold share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(compute_content_hash(&bytes))
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind() == kind).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
