//! Validation report generation.
//!
//! This module renders a validation run as Markdown or JSON.

use crate::models::{
    AgentEnvelope, ScopeResult, ValidationMetadata, ValidationReport, ValidationSummary,
};
use anyhow::Result;
use serde_json::Value;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &ValidationReport) -> String {
    let mut output = String::new();

    output.push_str("# Business Validation Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary, &report.results));

    for result in &report.results {
        output.push_str(&generate_scope_section(result));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ValidationMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Concept:** {}\n", metadata.concept));
    section.push_str(&format!("- **Target Market:** {}\n", metadata.target_market));
    section.push_str(&format!("- **Scenario:** {}\n", metadata.scenario));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary table.
fn generate_summary_section(summary: &ValidationSummary, results: &[ScopeResult]) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "{} of {} analyses completed",
        summary.completed, summary.total
    ));
    if summary.fell_back > 0 {
        section.push_str(&format!(", {} fell back", summary.fell_back));
    }
    section.push_str(".\n\n");

    section.push_str("| Analysis | Agent | Status | Confidence |\n");
    section.push_str("|:---|:---|:---:|:---:|\n");

    for result in results {
        let (status, confidence) = match &result.envelope {
            AgentEnvelope::Success(s) => ("✅ completed", format!("{:.0}%", s.confidence_score * 100.0)),
            AgentEnvelope::Fallback(_) => ("⚠️ fallback", "-".to_string()),
        };
        section.push_str(&format!(
            "| {} | `{}` | {} | {} |\n",
            result.kind.title(),
            result.envelope.agent(),
            status,
            confidence
        ));
    }
    section.push('\n');

    section
}

/// Generate the section for a single analysis scope.
fn generate_scope_section(result: &ScopeResult) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", result.kind.title()));

    match &result.envelope {
        AgentEnvelope::Success(s) => {
            section.push_str(&format!(
                "*Agent: {} | Model: {} | Confidence: {:.2} | Time: {:.2}s*\n\n",
                s.agent, s.model, s.confidence_score, s.processing_time
            ));

            if let Some(Value::Array(sources)) = s.metadata.get("data_sources") {
                let sources: Vec<&str> = sources.iter().filter_map(Value::as_str).collect();
                if !sources.is_empty() {
                    section.push_str(&format!("**Data sources:** {}\n\n", sources.join(", ")));
                }
            }

            section.push_str(s.analysis.trim());
            section.push_str("\n\n");
        }
        AgentEnvelope::Fallback(f) => {
            section.push_str(&format!("> ⚠️ **Fallback:** {}\n>\n", f.analysis));
            section.push_str(&format!("> **Error:** `{}`\n\n", f.error));
        }
    }

    section.push_str("---\n\n");

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "*Report generated by BizAgent. Analyses are model-generated and should be verified before acting on them.*\n"
        .to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ValidationReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisKind, FallbackEnvelope, SuccessEnvelope};
    use chrono::Utc;
    use serde_json::{json, Map};

    fn create_test_report() -> ValidationReport {
        let mut metadata = Map::new();
        metadata.insert(
            "data_sources".to_string(),
            json!(["industry_reports", "consumer_surveys"]),
        );

        let results = vec![
            ScopeResult {
                kind: AnalysisKind::Market,
                envelope: AgentEnvelope::Success(SuccessEnvelope {
                    agent: "market_analysis_agent".to_string(),
                    model: "test-model".to_string(),
                    analysis: "TAM is roughly $2B.".to_string(),
                    confidence_score: 0.87,
                    processing_time: 2.5,
                    metadata,
                    live_execution: true,
                }),
            },
            ScopeResult {
                kind: AnalysisKind::Risk,
                envelope: AgentEnvelope::Fallback(FallbackEnvelope::new(
                    "risk_assessment_agent",
                    "Request timed out after 120s",
                )),
            },
        ];

        ValidationReport {
            metadata: ValidationMetadata {
                concept: "Office coffee subscriptions".to_string(),
                target_market: "Germany".to_string(),
                scenario: "comprehensive business analysis".to_string(),
                model_used: "test-model".to_string(),
                generated_at: Utc::now(),
                duration_seconds: 2.6,
            },
            summary: ValidationSummary::from_results(&results),
            results,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Business Validation Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("Office coffee subscriptions"));
        assert!(markdown.contains("1 of 2 analyses completed, 1 fell back."));
        assert!(markdown.contains("## Market Analysis"));
        assert!(markdown.contains("TAM is roughly $2B."));
        assert!(markdown.contains("industry_reports, consumer_surveys"));
        assert!(markdown.contains("## Risk Assessment"));
        assert!(markdown.contains("Request timed out after 120s"));
    }

    #[test]
    fn test_summary_table_rows() {
        let report = create_test_report();
        let section = generate_summary_section(&report.summary, &report.results);

        assert!(section.contains("| Market Analysis | `market_analysis_agent` | ✅ completed | 87% |"));
        assert!(section.contains("| Risk Assessment | `risk_assessment_agent` | ⚠️ fallback | - |"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["target_market"], "Germany");
        assert_eq!(value["summary"]["fell_back"], 1);
        assert_eq!(value["results"][0]["kind"], "market");
        assert_eq!(value["results"][0]["envelope"]["live_execution"], true);
        assert_eq!(value["results"][1]["envelope"]["fallback"], true);
    }
}
