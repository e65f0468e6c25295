//! Registry of agents sharing one runtime.

use crate::agent::profile::all_profiles;
use crate::agent::runtime::HttpAgentRuntime;
use crate::agent::{AgentError, AgentRuntime, BusinessAgent};
use crate::config::ModelConfig;
use crate::models::AnalysisKind;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One agent per analysis kind.
pub struct AgentRegistry {
    agents: BTreeMap<AnalysisKind, BusinessAgent>,
    model: String,
}

impl AgentRegistry {
    /// Build a registry backed by the HTTP runtime described in `config`.
    pub fn from_config(config: &ModelConfig) -> Result<Self, AgentError> {
        let runtime = HttpAgentRuntime::new(config)?;
        Ok(Self::with_runtime(Arc::new(runtime)))
    }

    /// Build a registry backed by any runtime.
    pub fn with_runtime(runtime: Arc<dyn AgentRuntime>) -> Self {
        let model = runtime.model().to_string();
        let agents = all_profiles()
            .iter()
            .map(|profile| (profile.kind, BusinessAgent::new(profile, Arc::clone(&runtime))))
            .collect();

        Self { agents, model }
    }

    pub fn get(&self, kind: AnalysisKind) -> Option<&BusinessAgent> {
        self.agents.get(&kind)
    }

    pub fn agents(&self) -> impl Iterator<Item = &BusinessAgent> {
        self.agents.values()
    }

    /// Model answering for every agent.
    pub fn model(&self) -> &str {
        &self.model
    }
}
