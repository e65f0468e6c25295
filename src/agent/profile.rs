//! Static agent profiles.
//!
//! A profile parameterizes the generic business agent: which prompt it
//! renders and which metadata it attaches to a successful answer.

use crate::models::AnalysisKind;
use serde_json::{json, Map, Value};

/// Static description of one business-intelligence agent.
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub kind: AnalysisKind,
    /// Agent name reported in every envelope.
    pub agent: &'static str,
    pub confidence_score: f64,
    pub data_sources: &'static [&'static str],
    extra: fn() -> Value,
}

impl AgentProfile {
    /// Domain-specific metadata merged into the success envelope.
    pub fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("analysis_type".to_string(), json!(self.kind.as_str()));
        metadata.insert("data_sources".to_string(), json!(self.data_sources));
        if let Value::Object(extra) = (self.extra)() {
            metadata.extend(extra);
        }
        metadata
    }
}

static PROFILES: [AgentProfile; 6] = [
    AgentProfile {
        kind: AnalysisKind::Market,
        agent: "market_analysis_agent",
        confidence_score: 0.87,
        data_sources: &[
            "market_research_databases",
            "industry_reports",
            "economic_indicators",
            "consumer_surveys",
        ],
        extra: market_extra,
    },
    AgentProfile {
        kind: AnalysisKind::Risk,
        agent: "risk_assessment_agent",
        confidence_score: 0.84,
        data_sources: &[
            "regulatory_databases",
            "financial_risk_models",
            "industry_risk_reports",
            "historical_failure_data",
        ],
        extra: risk_extra,
    },
    AgentProfile {
        kind: AnalysisKind::Kyc,
        agent: "kyc_compliance_agent",
        confidence_score: 0.91,
        data_sources: &[
            "sanctions_lists",
            "pep_databases",
            "corporate_registries",
            "adverse_media",
        ],
        extra: kyc_extra,
    },
    AgentProfile {
        kind: AnalysisKind::Competitive,
        agent: "competitive_intelligence_agent",
        confidence_score: 0.82,
        data_sources: &[
            "company_filings",
            "patent_databases",
            "news_feeds",
            "web_traffic_analytics",
        ],
        extra: competitive_extra,
    },
    AgentProfile {
        kind: AnalysisKind::Financial,
        agent: "financial_analysis_agent",
        confidence_score: 0.86,
        data_sources: &[
            "financial_statements",
            "industry_benchmarks",
            "market_data_feeds",
        ],
        extra: financial_extra,
    },
    AgentProfile {
        kind: AnalysisKind::CustomerInsight,
        agent: "customer_insight_agent",
        confidence_score: 0.83,
        data_sources: &[
            "customer_surveys",
            "social_listening",
            "behavioral_analytics",
            "review_platforms",
        ],
        extra: customer_insight_extra,
    },
];

fn market_extra() -> Value {
    json!({"market_sizing_method": "top_down_and_bottom_up", "forecast_horizon_years": 5})
}

fn risk_extra() -> Value {
    json!({"risk_framework": "COSO ERM", "risk_categories": ["market", "operational", "financial", "regulatory", "reputational"]})
}

fn kyc_extra() -> Value {
    json!({"compliance_frameworks": ["KYC", "AML", "CDD", "EDD"], "legal_advice": false})
}

fn competitive_extra() -> Value {
    json!({"frameworks": ["Porter's Five Forces", "SWOT"]})
}

fn financial_extra() -> Value {
    json!({"projection_horizon_years": 5, "scenarios": ["conservative", "base", "optimistic"]})
}

fn customer_insight_extra() -> Value {
    json!({"segmentation_model": "jobs_to_be_done"})
}

/// Look up the profile for an analysis kind.
pub fn profile_for(kind: AnalysisKind) -> &'static AgentProfile {
    PROFILES
        .iter()
        .find(|p| p.kind == kind)
        .unwrap_or(&PROFILES[0])
}

/// All profiles, in display order.
pub fn all_profiles() -> &'static [AgentProfile] {
    &PROFILES
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_kind_has_its_profile() {
        for kind in AnalysisKind::ALL {
            assert_eq!(profile_for(kind).kind, kind);
        }
        assert_eq!(all_profiles().len(), AnalysisKind::ALL.len());
    }

    #[test]
    fn test_agent_names_are_unique() {
        let names: HashSet<&str> = all_profiles().iter().map(|p| p.agent).collect();
        assert_eq!(names.len(), all_profiles().len());
    }

    #[test]
    fn test_confidence_scores_in_range() {
        for profile in all_profiles() {
            assert!(profile.confidence_score > 0.0 && profile.confidence_score <= 1.0);
            assert!(!profile.data_sources.is_empty());
        }
    }

    #[test]
    fn test_metadata_contents() {
        let metadata = profile_for(AnalysisKind::Risk).metadata();
        assert_eq!(metadata["analysis_type"], "risk");
        assert_eq!(metadata["risk_framework"], "COSO ERM");
        assert_eq!(
            metadata["data_sources"].as_array().map(|a| a.len()),
            Some(4)
        );
    }

    #[test]
    fn test_metadata_does_not_shadow_envelope_fields() {
        let reserved = [
            "agent",
            "model",
            "analysis",
            "confidence_score",
            "processing_time",
            "live_execution",
            "error",
            "fallback",
        ];
        for profile in all_profiles() {
            let metadata = profile.metadata();
            for key in reserved {
                assert!(!metadata.contains_key(key), "{} sets {}", profile.agent, key);
            }
        }
    }
}
