//! Business-concept validation.
//!
//! Runs a set of agents against one concept and collects their envelopes
//! into a [`ValidationReport`].

use crate::agent::profile::profile_for;
use crate::agent::{AgentError, AgentRegistry};
use crate::models::{
    AgentEnvelope, AgentRequest, AnalysisKind, FallbackEnvelope, ScopeResult, ValidationMetadata,
    ValidationReport, ValidationSummary,
};
use chrono::Utc;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A concept to validate and the analyses to run on it.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub concept: String,
    pub market: Option<String>,
    pub scenario: Option<String>,
    pub scopes: Vec<AnalysisKind>,
}

impl ValidationRequest {
    /// The payload sent to every agent.
    pub fn agent_request(&self) -> AgentRequest {
        AgentRequest {
            scenario: self.scenario.clone(),
            business_concept: Some(self.concept.clone()),
            target_market: self.market.clone(),
        }
    }
}

/// Run every requested scope concurrently and build the report.
pub async fn run_validation(
    registry: &AgentRegistry,
    request: &ValidationRequest,
    show_progress: bool,
) -> ValidationReport {
    let start = Instant::now();
    let agent_request = request.agent_request();
    let resolved = agent_request.resolve();

    info!(
        "Validating '{}' in {} across {} scopes",
        resolved.business_concept,
        resolved.target_market,
        request.scopes.len()
    );

    let pb = progress_bar(request.scopes.len(), show_progress);

    let runs = request.scopes.iter().map(|&kind| {
        let pb = pb.clone();
        let agent_request = &agent_request;
        async move {
            let envelope = match registry.get(kind) {
                Some(agent) => agent.invoke(agent_request).await,
                None => {
                    warn!("No agent registered for {}", kind);
                    AgentEnvelope::Fallback(FallbackEnvelope::new(
                        profile_for(kind).agent,
                        format!("no agent registered for {}", kind),
                    ))
                }
            };
            pb.inc(1);
            ScopeResult { kind, envelope }
        }
    });

    let results = join_all(runs).await;
    pb.finish_and_clear();

    ValidationReport {
        metadata: ValidationMetadata {
            concept: resolved.business_concept,
            target_market: resolved.target_market,
            scenario: resolved.scenario,
            model_used: registry.model().to_string(),
            generated_at: Utc::now(),
            duration_seconds: start.elapsed().as_secs_f64(),
        },
        summary: ValidationSummary::from_results(&results),
        results,
    }
}

/// Process exit code for a finished validation: 1 when any scope fell back.
pub fn exit_code(summary: &ValidationSummary) -> i32 {
    if summary.fell_back > 0 {
        1
    } else {
        0
    }
}

/// Render the prompts a validation would send, without calling the runtime.
pub fn render_prompts(
    registry: &AgentRegistry,
    request: &ValidationRequest,
) -> Result<String, AgentError> {
    let agent_request = request.agent_request();
    let mut output = String::new();

    for &kind in &request.scopes {
        let Some(agent) = registry.get(kind) else {
            continue;
        };
        output.push_str(&format!(
            "### {} ({})\n\n",
            kind.title(),
            agent.profile().agent
        ));
        output.push_str(&agent.prompt_for(&agent_request)?);
        output.push_str("\n\n");
    }

    Ok(output)
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Consulting agents");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
