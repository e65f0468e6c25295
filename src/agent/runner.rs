//! The generic business agent.
//!
//! One agent type serves every analysis kind; its behaviour comes from an
//! [`AgentProfile`]. An invocation never fails: any error becomes a
//! fallback envelope.

use crate::agent::profile::AgentProfile;
use crate::agent::runtime::{AgentError, AgentRuntime};
use crate::models::{AgentEnvelope, AgentRequest, FallbackEnvelope, SuccessEnvelope};
use crate::prompts::{self, SYSTEM_PROMPT};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A business-intelligence agent bound to a runtime.
#[derive(Clone)]
pub struct BusinessAgent {
    profile: &'static AgentProfile,
    runtime: Arc<dyn AgentRuntime>,
}

impl BusinessAgent {
    pub fn new(profile: &'static AgentProfile, runtime: Arc<dyn AgentRuntime>) -> Self {
        Self { profile, runtime }
    }

    pub fn profile(&self) -> &'static AgentProfile {
        self.profile
    }

    /// Render the prompt this agent would send for a request.
    pub fn prompt_for(&self, request: &AgentRequest) -> Result<String, AgentError> {
        Ok(prompts::build_prompt(self.profile.kind, &request.resolve())?)
    }

    /// Run the agent and wrap the outcome in an envelope.
    pub async fn invoke(&self, request: &AgentRequest) -> AgentEnvelope {
        let start = Instant::now();

        match self.run(request).await {
            Ok(analysis) => {
                let processing_time = round_millis(start.elapsed().as_secs_f64());
                info!(
                    "{} answered in {:.3}s ({} chars)",
                    self.profile.agent,
                    processing_time,
                    analysis.len()
                );

                AgentEnvelope::Success(SuccessEnvelope {
                    agent: self.profile.agent.to_string(),
                    model: self.runtime.model().to_string(),
                    analysis,
                    confidence_score: self.profile.confidence_score,
                    processing_time,
                    metadata: self.profile.metadata(),
                    live_execution: true,
                })
            }
            Err(e) => {
                warn!("{} fell back: {}", self.profile.agent, e);
                AgentEnvelope::Fallback(FallbackEnvelope::new(self.profile.agent, e.to_string()))
            }
        }
    }

    async fn run(&self, request: &AgentRequest) -> Result<String, AgentError> {
        let prompt = self.prompt_for(request)?;
        debug!("{} prompt:\n{}", self.profile.agent, prompt);
        self.runtime.complete(SYSTEM_PROMPT, &prompt).await
    }
}

fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
