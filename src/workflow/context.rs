//! Per-run state threaded through the pipeline

use crate::processing::records::{AlignedRecord, JobRecord, OptimizedRecord, ProfileMatch, ProfileRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Accumulated state of one pipeline execution, addressed by `run_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: String,
    pub job_url: String,
    pub profile_id: String,
    #[serde(default)]
    pub job_record: Option<JobRecord>,
    #[serde(default)]
    pub profile_record: Option<ProfileRecord>,
    #[serde(default)]
    pub aligned_record: Option<AlignedRecord>,
    #[serde(default)]
    pub optimized_record: Option<OptimizedRecord>,
    #[serde(default)]
    pub artifact_path: Option<PathBuf>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub execution_time: BTreeMap<String, f64>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, job_url: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            job_url: job_url.into(),
            profile_id: profile_id.into(),
            ..Self::default()
        }
    }

    /// Merge a partial update: scalars overwrite, maps merge key-wise, lists append
    pub fn apply(&mut self, update: ContextUpdate) {
        if let Some(job) = update.job_record {
            self.job_record = Some(job);
        }
        if let Some(profile) = update.profile_record {
            self.profile_record = Some(profile);
        }
        if let Some(aligned) = update.aligned_record {
            self.aligned_record = Some(aligned);
        }
        if let Some(optimized) = update.optimized_record {
            self.optimized_record = Some(optimized);
        }
        if let Some(path) = update.artifact_path {
            self.artifact_path = Some(path);
        }

        self.metadata.extend(update.metadata);
        self.execution_time.extend(update.execution_time);
        self.errors.extend(update.errors);
        self.warnings.extend(update.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn state(&self) -> Option<PipelineState> {
        self.metadata
            .get(PipelineState::METADATA_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Partial change to a `RunContext`
#[derive(Debug, Clone, Default)]
pub struct ContextUpdate {
    pub job_record: Option<JobRecord>,
    pub profile_record: Option<ProfileRecord>,
    pub aligned_record: Option<AlignedRecord>,
    pub optimized_record: Option<OptimizedRecord>,
    pub artifact_path: Option<PathBuf>,
    pub metadata: BTreeMap<String, Value>,
    pub execution_time: BTreeMap<String, f64>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ContextUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_record(mut self, job: JobRecord) -> Self {
        self.job_record = Some(job);
        self
    }

    /// Store the retrieved profile and its relevance
    pub fn profile_match(mut self, found: ProfileMatch) -> Self {
        self.metadata
            .insert("profile_relevance".to_string(), Value::from(found.relevance as f64));
        self.profile_record = Some(found.profile);
        self
    }

    pub fn aligned_record(mut self, aligned: AlignedRecord) -> Self {
        self.aligned_record = Some(aligned);
        self
    }

    pub fn optimized_record(mut self, optimized: OptimizedRecord) -> Self {
        self.optimized_record = Some(optimized);
        self
    }

    pub fn artifact_path(mut self, path: PathBuf) -> Self {
        self.artifact_path = Some(path);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn state(self, state: PipelineState) -> Self {
        let value = serde_json::to_value(state).unwrap_or(Value::Null);
        self.metadata(PipelineState::METADATA_KEY, value)
    }

    pub fn timing(mut self, key: impl Into<String>, seconds: f64) -> Self {
        self.execution_time.insert(key.into(), seconds);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    pub fn warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }
}

/// The five pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ExtractJob,
    RetrieveProfile,
    AlignContent,
    OptimizeAts,
    RenderDocument,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::ExtractJob,
        Stage::RetrieveProfile,
        Stage::AlignContent,
        Stage::OptimizeAts,
        Stage::RenderDocument,
    ];

    /// Key used in `execution_time` and `completed_stages`
    pub fn name(&self) -> &'static str {
        match self {
            Stage::ExtractJob => "extract_job",
            Stage::RetrieveProfile => "retrieve_profile",
            Stage::AlignContent => "align_content",
            Stage::OptimizeAts => "optimize_ats",
            Stage::RenderDocument => "render_document",
        }
    }

    /// Prefix for error messages raised by this stage
    pub fn failure_label(&self) -> &'static str {
        match self {
            Stage::ExtractJob => "Failed to extract job data",
            Stage::RetrieveProfile => "Failed to retrieve profile",
            Stage::AlignContent => "Failed to align content",
            Stage::OptimizeAts => "Failed to optimize for ATS",
            Stage::RenderDocument => "Failed to render document",
        }
    }

    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::ExtractJob => Some(Stage::RetrieveProfile),
            Stage::RetrieveProfile => Some(Stage::AlignContent),
            Stage::AlignContent => Some(Stage::OptimizeAts),
            Stage::OptimizeAts => Some(Stage::RenderDocument),
            Stage::RenderDocument => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Position of a run in the pipeline state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Running(Stage),
    Done,
    Failed(Stage),
}

impl PipelineState {
    pub const METADATA_KEY: &'static str = "pipeline_state";

    /// State after `stage` succeeds
    pub fn after_success(stage: Stage) -> Self {
        match stage.next() {
            Some(next) => PipelineState::Running(next),
            None => PipelineState::Done,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineState::Init => write!(f, "init"),
            PipelineState::Running(stage) => write!(f, "running:{}", stage),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed(stage) => write!(f, "failed:{}", stage),
        }
    }
}
