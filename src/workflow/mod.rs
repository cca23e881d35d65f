//! Pipeline orchestration and durable run state

pub mod context;
pub mod context_store;
pub mod orchestrator;

pub use context::{ContextUpdate, PipelineState, RunContext, Stage};
pub use context_store::ContextStore;
pub use orchestrator::{Orchestrator, PipelineEvent, PipelineObserver, RunResult};
