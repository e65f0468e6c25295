//! Data models for business-intelligence agents.
//!
//! This module contains the request payload accepted by every agent,
//! the analysis kinds, and the two response envelopes an agent can return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

const DEFAULT_SCENARIO: &str = "comprehensive business analysis";
const DEFAULT_BUSINESS_CONCEPT: &str = "an unspecified business concept";
const DEFAULT_TARGET_MARKET: &str = "the global market";

/// The kind of analysis an agent performs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Market sizing, trends and demand
    Market,
    /// Operational, financial and regulatory risk
    Risk,
    /// Know-your-customer and AML compliance
    Kyc,
    /// Competitor landscape and positioning
    Competitive,
    /// Revenue model, unit economics and projections
    Financial,
    /// Customer segments, needs and behaviour
    #[value(name = "customer_insight", alias = "customer-insight")]
    #[serde(alias = "customer-insight")]
    CustomerInsight,
}

impl AnalysisKind {
    /// All kinds, in display order.
    pub const ALL: [AnalysisKind; 6] = [
        AnalysisKind::Market,
        AnalysisKind::Risk,
        AnalysisKind::Kyc,
        AnalysisKind::Competitive,
        AnalysisKind::Financial,
        AnalysisKind::CustomerInsight,
    ];

    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Market => "market",
            AnalysisKind::Risk => "risk",
            AnalysisKind::Kyc => "kyc",
            AnalysisKind::Competitive => "competitive",
            AnalysisKind::Financial => "financial",
            AnalysisKind::CustomerInsight => "customer_insight",
        }
    }

    /// Human-readable title used in reports.
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisKind::Market => "Market Analysis",
            AnalysisKind::Risk => "Risk Assessment",
            AnalysisKind::Kyc => "KYC & Compliance",
            AnalysisKind::Competitive => "Competitive Intelligence",
            AnalysisKind::Financial => "Financial Analysis",
            AnalysisKind::CustomerInsight => "Customer Insights",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "market" => Ok(AnalysisKind::Market),
            "risk" => Ok(AnalysisKind::Risk),
            "kyc" => Ok(AnalysisKind::Kyc),
            "competitive" => Ok(AnalysisKind::Competitive),
            "financial" => Ok(AnalysisKind::Financial),
            "customer_insight" | "customer-insight" => Ok(AnalysisKind::CustomerInsight),
            other => Err(format!("Unknown analysis kind: {}", other)),
        }
    }
}

/// Request payload accepted by every agent.
///
/// All fields are optional; missing or blank values fall back to defaults
/// when the request is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_concept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_market: Option<String>,
}

/// A request with every field filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub scenario: String,
    pub business_concept: String,
    pub target_market: String,
}

impl AgentRequest {
    /// Fill in defaults for missing or blank fields.
    pub fn resolve(&self) -> ResolvedRequest {
        ResolvedRequest {
            scenario: field_or(&self.scenario, DEFAULT_SCENARIO),
            business_concept: field_or(&self.business_concept, DEFAULT_BUSINESS_CONCEPT),
            target_market: field_or(&self.target_market, DEFAULT_TARGET_MARKET),
        }
    }

    /// Build a request from an arbitrary JSON payload.
    ///
    /// Non-string scalars are used as their JSON text. A payload that is not
    /// an object yields an empty request.
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            scenario: payload_text(payload, "scenario"),
            business_concept: payload_text(payload, "business_concept"),
            target_market: payload_text(payload, "target_market"),
        }
    }
}

/// Text of a payload field; `null` and absent fields are `None`.
pub fn payload_text(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn field_or(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Envelope returned when the runtime produced an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEnvelope {
    pub agent: String,
    pub model: String,
    pub analysis: String,
    pub confidence_score: f64,
    /// Wall time of the invocation in seconds.
    pub processing_time: f64,
    /// Domain-specific metadata (data sources, analysis type, ...).
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
    pub live_execution: bool,
}

/// Envelope returned when the invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackEnvelope {
    pub agent: String,
    pub error: String,
    pub fallback: bool,
    pub analysis: String,
}

impl FallbackEnvelope {
    /// Create a fallback envelope for the given agent and error message.
    pub fn new(agent: &str, error: impl Into<String>) -> Self {
        Self {
            agent: agent.to_string(),
            error: error.into(),
            fallback: true,
            analysis: format!(
                "The {} could not complete this analysis right now. \
                 Please try again later or refine the request.",
                agent.replace('_', " ")
            ),
        }
    }
}

/// The response of an agent invocation: always one of two fixed shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentEnvelope {
    Success(SuccessEnvelope),
    Fallback(FallbackEnvelope),
}

impl AgentEnvelope {
    /// Name of the agent that produced the envelope.
    pub fn agent(&self) -> &str {
        match self {
            AgentEnvelope::Success(s) => &s.agent,
            AgentEnvelope::Fallback(f) => &f.agent,
        }
    }

    /// The analysis text (or the fallback apology).
    pub fn analysis(&self) -> &str {
        match self {
            AgentEnvelope::Success(s) => &s.analysis,
            AgentEnvelope::Fallback(f) => &f.analysis,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AgentEnvelope::Fallback(_))
    }
}

/// Outcome of one analysis scope in a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeResult {
    pub kind: AnalysisKind,
    pub envelope: AgentEnvelope,
}

/// Counts of completed and fallen-back scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub completed: usize,
    pub fell_back: usize,
}

impl ValidationSummary {
    /// Creates a summary from scope results.
    pub fn from_results(results: &[ScopeResult]) -> Self {
        let fell_back = results.iter().filter(|r| r.envelope.is_fallback()).count();
        Self {
            total: results.len(),
            completed: results.len() - fell_back,
            fell_back,
        }
    }
}

/// Metadata about a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetadata {
    pub concept: String,
    pub target_market: String,
    pub scenario: String,
    pub model_used: String,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// The complete business-concept validation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub metadata: ValidationMetadata,
    pub summary: ValidationSummary,
    pub results: Vec<ScopeResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_defaults() {
        let resolved = AgentRequest::default().resolve();
        assert_eq!(resolved.scenario, DEFAULT_SCENARIO);
        assert_eq!(resolved.business_concept, DEFAULT_BUSINESS_CONCEPT);
        assert_eq!(resolved.target_market, DEFAULT_TARGET_MARKET);
    }

    #[test]
    fn test_request_from_payload_coerces_scalars() {
        let payload = serde_json::json!({
            "scenario": 42,
            "business_concept": "Vertical farming",
            "target_market": null,
            "unrelated": true
        });
        let request = AgentRequest::from_payload(&payload);
        assert_eq!(request.scenario.as_deref(), Some("42"));
        assert_eq!(request.business_concept.as_deref(), Some("Vertical farming"));
        assert_eq!(request.target_market, None);

        assert_eq!(
            AgentRequest::from_payload(&serde_json::json!(["not", "an", "object"])),
            AgentRequest::default()
        );
    }

    #[test]
    fn test_resolve_trims_and_ignores_blank() {
        let request = AgentRequest {
            scenario: Some("   ".to_string()),
            business_concept: Some("  Meal kits for runners ".to_string()),
            target_market: Some("Nordics".to_string()),
        };
        let resolved = request.resolve();
        assert_eq!(resolved.scenario, DEFAULT_SCENARIO);
        assert_eq!(resolved.business_concept, "Meal kits for runners");
        assert_eq!(resolved.target_market, "Nordics");
    }

    #[test]
    fn test_request_ignores_unknown_keys() {
        let request: AgentRequest =
            serde_json::from_value(json!({"business_concept": "X", "extra": 1})).unwrap();
        assert_eq!(request.business_concept.as_deref(), Some("X"));
        assert!(request.scenario.is_none());
    }

    #[test]
    fn test_analysis_kind_from_str() {
        assert_eq!("market".parse::<AnalysisKind>(), Ok(AnalysisKind::Market));
        assert_eq!("KYC".parse::<AnalysisKind>(), Ok(AnalysisKind::Kyc));
        assert_eq!(
            "customer-insight".parse::<AnalysisKind>(),
            Ok(AnalysisKind::CustomerInsight)
        );
        assert!("weather".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn test_analysis_kind_wire_name() {
        let value = serde_json::to_value(AnalysisKind::CustomerInsight).unwrap();
        assert_eq!(value, json!("customer_insight"));
        for kind in AnalysisKind::ALL {
            assert_eq!(kind.as_str().parse::<AnalysisKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_success_envelope_shape() {
        let mut metadata = Map::new();
        metadata.insert("data_sources".to_string(), json!(["industry_reports"]));
        let envelope = AgentEnvelope::Success(SuccessEnvelope {
            agent: "market_analysis_agent".to_string(),
            model: "llama3.2:latest".to_string(),
            analysis: "Strong demand".to_string(),
            confidence_score: 0.87,
            processing_time: 1.25,
            metadata,
            live_execution: true,
        });

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["agent"], "market_analysis_agent");
        assert_eq!(value["data_sources"], json!(["industry_reports"]));
        assert_eq!(value["live_execution"], true);
        assert!(value.get("metadata").is_none());
        assert!(value.get("fallback").is_none());
    }

    #[test]
    fn test_fallback_envelope_shape() {
        let envelope = AgentEnvelope::Fallback(FallbackEnvelope::new(
            "risk_assessment_agent",
            "connection refused",
        ));
        assert!(envelope.is_fallback());

        let value = serde_json::to_value(&envelope).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(value["fallback"], true);
        assert_eq!(value["error"], "connection refused");
        assert!(value["analysis"]
            .as_str()
            .unwrap()
            .contains("risk assessment agent"));
    }

    #[test]
    fn test_envelope_deserializes_either_shape() {
        let fallback: AgentEnvelope = serde_json::from_value(json!({
            "agent": "kyc_compliance_agent",
            "error": "timeout",
            "fallback": true,
            "analysis": "unavailable"
        }))
        .unwrap();
        assert!(fallback.is_fallback());
        assert_eq!(fallback.agent(), "kyc_compliance_agent");
    }

    #[test]
    fn test_validation_summary() {
        let results = vec![
            ScopeResult {
                kind: AnalysisKind::Market,
                envelope: AgentEnvelope::Fallback(FallbackEnvelope::new("market_analysis_agent", "x")),
            },
            ScopeResult {
                kind: AnalysisKind::Risk,
                envelope: AgentEnvelope::Fallback(FallbackEnvelope::new("risk_assessment_agent", "y")),
            },
        ];
        let summary = ValidationSummary::from_results(&results);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.fell_back, 2);
    }
}
