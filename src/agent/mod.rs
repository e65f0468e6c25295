//! Business-intelligence agents.
//!
//! Every agent is the same [`BusinessAgent`] parameterized by a static
//! profile, talking to the hosted model through the [`AgentRuntime`] seam.

pub mod profile;
pub mod registry;
pub mod runner;
pub mod runtime;

pub use registry::AgentRegistry;
pub use runner::BusinessAgent;
pub use runtime::{AgentError, AgentRuntime};
