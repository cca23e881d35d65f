//! Five-stage resume optimization pipeline

use crate::config::Config;
use crate::error::{Result, ResumeOptimizerError};
use crate::input::collaborators::{DocumentRenderer, JobExtractor, ProfileRetriever};
use crate::processing::alignment::AlignmentScorer;
use crate::processing::ats_scorer::ATSScoringEngine;
use crate::processing::records::{AlignedRecord, JobRecord, OptimizedRecord, ProfileRecord};
use crate::workflow::context::{ContextUpdate, PipelineState, RunContext, Stage};
use crate::workflow::context_store::{is_valid_run_id, ContextStore};
use chrono::Utc;
use log::{debug, error, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

/// Progress notifications emitted while a run executes
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted { run_id: String, stage: Stage },
    StageCompleted { run_id: String, stage: Stage, seconds: f64 },
    StageFailed { run_id: String, stage: Stage, error: String },
    RunFinished { run_id: String, success: bool },
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Public outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub execution_time: BTreeMap<String, f64>,
    pub artifact_path: Option<PathBuf>,
    pub run_id: String,
    pub completed_stages: Vec<String>,
    pub ats_score: Option<u8>,
}

impl RunResult {
    fn from_context(context: &RunContext, completed: &[Stage]) -> Self {
        Self {
            success: !context.has_errors() && context.artifact_path.is_some(),
            errors: context.errors.clone(),
            warnings: context.warnings.clone(),
            execution_time: context.execution_time.clone(),
            artifact_path: context.artifact_path.clone(),
            run_id: context.run_id.clone(),
            completed_stages: completed.iter().map(|stage| stage.name().to_string()).collect(),
            ats_score: context.optimized_record.as_ref().map(OptimizedRecord::final_score),
        }
    }
}

/// Runs extract, retrieve, align, score, and render in order over one `RunContext`
///
/// Holds no per-run state, so a single instance can drive concurrent runs with distinct ids.
pub struct Orchestrator<J, P, R> {
    job_extractor: J,
    profile_retriever: P,
    renderer: R,
    alignment: AlignmentScorer,
    ats: ATSScoringEngine,
    store: ContextStore,
    template: String,
    min_profile_relevance: f32,
    observer: Option<Box<dyn PipelineObserver>>,
    url_regex: Regex,
    profile_id_regex: Regex,
}

impl<J, P, R> Orchestrator<J, P, R>
where
    J: JobExtractor,
    P: ProfileRetriever,
    R: DocumentRenderer,
{
    pub fn new(job_extractor: J, profile_retriever: P, renderer: R, store: ContextStore) -> Result<Self> {
        let url_regex = Regex::new(r"^(?:https?|file)://\S+$")
            .map_err(|e| ResumeOptimizerError::Configuration(format!("Invalid URL pattern: {}", e)))?;
        let profile_id_regex = Regex::new(r"^[A-Za-z0-9_.-]+$")
            .map_err(|e| ResumeOptimizerError::Configuration(format!("Invalid profile id pattern: {}", e)))?;

        Ok(Self {
            job_extractor,
            profile_retriever,
            renderer,
            alignment: AlignmentScorer::new()?,
            ats: ATSScoringEngine::new()?,
            store,
            template: "markdown".to_string(),
            min_profile_relevance: 0.1,
            observer: None,
            url_regex,
            profile_id_regex,
        })
    }

    /// Build with scorer weights, template, store location, and thresholds from `config`
    pub fn from_config(config: &Config, job_extractor: J, profile_retriever: P, renderer: R) -> Result<Self> {
        let store = ContextStore::new(&config.workflow.context_dir);
        Ok(Self::new(job_extractor, profile_retriever, renderer, store)?
            .with_alignment(AlignmentScorer::from_config(&config.alignment)?)
            .with_ats(ATSScoringEngine::from_config(&config.ats)?)
            .with_template(&config.workflow.template)
            .with_min_profile_relevance(config.workflow.min_profile_relevance))
    }

    pub fn with_alignment(mut self, alignment: AlignmentScorer) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_ats(mut self, ats: ATSScoringEngine) -> Self {
        self.ats = ats;
        self
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_string();
        self
    }

    pub fn with_min_profile_relevance(mut self, threshold: f32) -> Self {
        self.min_profile_relevance = threshold;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    /// Reject malformed input before any stage runs
    pub fn validate(&self, run_id: &str, job_url: &str, profile_id: &str) -> Result<()> {
        let job_url = job_url.trim();
        if job_url.is_empty() {
            return Err(ResumeOptimizerError::Validation("job URL must not be empty".to_string()));
        }
        if job_url.contains("://") && !self.url_regex.is_match(job_url) {
            return Err(ResumeOptimizerError::Validation(format!("Malformed job URL: '{}'", job_url)));
        }
        if job_url.chars().any(char::is_control) {
            return Err(ResumeOptimizerError::Validation("job URL contains control characters".to_string()));
        }

        if !self.profile_id_regex.is_match(profile_id) || profile_id == "." || profile_id == ".." {
            return Err(ResumeOptimizerError::Validation(format!("Malformed profile id: '{}'", profile_id)));
        }

        if !is_valid_run_id(run_id) {
            return Err(ResumeOptimizerError::Validation(format!("Malformed run id: '{}'", run_id)));
        }

        Ok(())
    }

    /// Execute a run under a freshly generated id
    pub async fn run(&self, job_url: &str, profile_id: &str) -> RunResult {
        self.run_with_id(&ContextStore::generate_id(), job_url, profile_id).await
    }

    /// Execute a run under a caller-chosen id; the caller guarantees uniqueness
    pub async fn run_with_id(&self, run_id: &str, job_url: &str, profile_id: &str) -> RunResult {
        let started = Instant::now();
        let mut context = RunContext::new(run_id, job_url, profile_id);
        info!("=== Starting run {} (job: {}, profile: {}) ===", run_id, job_url, profile_id);

        if let Err(e) = self.validate(run_id, job_url, profile_id) {
            error!("Run {} rejected: {}", run_id, e);
            context.errors.push(e.to_string());
            self.emit(PipelineEvent::RunFinished {
                run_id: run_id.to_string(),
                success: false,
            });
            return RunResult::from_context(&context, &[]);
        }

        context.apply(
            ContextUpdate::new()
                .metadata("created_at", Utc::now().to_rfc3339())
                .state(PipelineState::Init),
        );
        self.persist(&mut context).await;

        let mut completed = Vec::new();
        for stage in Stage::ALL {
            self.emit(PipelineEvent::StageStarted {
                run_id: run_id.to_string(),
                stage,
            });
            info!("[{}] Stage {} started", run_id, stage);

            let stage_started = Instant::now();
            let outcome = self.execute(stage, &context).await;
            let seconds = stage_started.elapsed().as_secs_f64();

            match outcome {
                Ok(update) => {
                    context.apply(
                        update
                            .timing(stage.name(), seconds)
                            .state(PipelineState::after_success(stage)),
                    );
                    completed.push(stage);
                    info!("[{}] Stage {} completed in {:.3}s", run_id, stage, seconds);
                    self.emit(PipelineEvent::StageCompleted {
                        run_id: run_id.to_string(),
                        stage,
                        seconds,
                    });
                    self.persist(&mut context).await;
                }
                Err(e) => {
                    let message = format!("{}: {}", stage.failure_label(), e);
                    error!("[{}] {}", run_id, message);
                    context.apply(
                        ContextUpdate::new()
                            .timing(stage.name(), seconds)
                            .error(message.clone())
                            .state(PipelineState::Failed(stage)),
                    );
                    self.emit(PipelineEvent::StageFailed {
                        run_id: run_id.to_string(),
                        stage,
                        error: message,
                    });
                    self.persist(&mut context).await;
                    break;
                }
            }
        }

        context.apply(ContextUpdate::new().timing("total", started.elapsed().as_secs_f64()));
        self.persist(&mut context).await;

        let result = RunResult::from_context(&context, &completed);
        if result.success {
            info!("=== Run {} finished successfully ===", run_id);
        } else {
            warn!("=== Run {} finished with {} error(s) ===", run_id, result.errors.len());
        }
        for warning in &result.warnings {
            warn!("[{}] {}", run_id, warning);
        }

        self.emit(PipelineEvent::RunFinished {
            run_id: run_id.to_string(),
            success: result.success,
        });
        result
    }

    async fn execute(&self, stage: Stage, context: &RunContext) -> Result<ContextUpdate> {
        match stage {
            Stage::ExtractJob => self.extract_job(context).await,
            Stage::RetrieveProfile => self.retrieve_profile(context).await,
            Stage::AlignContent => self.align_content(context),
            Stage::OptimizeAts => self.optimize_ats(context),
            Stage::RenderDocument => self.render_document(context).await,
        }
    }

    async fn extract_job(&self, context: &RunContext) -> Result<ContextUpdate> {
        let job = self.job_extractor.extract(&context.job_url).await?;
        if let Some(err) = &job.error {
            return Err(ResumeOptimizerError::Collaborator(err.clone()));
        }

        info!(
            "Extracted job '{}' with {} required skills",
            job.title,
            job.required_skills.len()
        );
        Ok(ContextUpdate::new().job_record(job))
    }

    async fn retrieve_profile(&self, context: &RunContext) -> Result<ContextUpdate> {
        let job = Self::require_job(context)?;
        let found = self.profile_retriever.retrieve(job, &context.profile_id).await?;
        if let Some(err) = &found.profile.error {
            return Err(ResumeOptimizerError::Collaborator(err.clone()));
        }

        info!(
            "Retrieved profile '{}' (relevance {:.2})",
            found.profile.id, found.relevance
        );

        let mut update = ContextUpdate::new();
        if found.relevance < self.min_profile_relevance {
            update = update.warning(format!(
                "Low profile relevance ({:.2}) for job '{}'",
                found.relevance, job.title
            ));
        }
        Ok(update.profile_match(found))
    }

    fn align_content(&self, context: &RunContext) -> Result<ContextUpdate> {
        let job = Self::require_job(context)?;
        let profile = Self::require_profile(context)?;

        let aligned = self.alignment.align(job, profile);
        info!(
            "Alignment score {:.2} ({} ranked experiences)",
            aligned.overall_alignment_score,
            aligned.ranked_experience.len()
        );
        debug!("Recommendations: {:?}", aligned.recommendations);

        Ok(ContextUpdate::new().aligned_record(aligned))
    }

    fn optimize_ats(&self, context: &RunContext) -> Result<ContextUpdate> {
        let aligned = Self::require_aligned(context)?;

        let optimized = self.ats.optimize(aligned);
        info!(
            "ATS score {} ({}), final {}",
            optimized.breakdown.ats_score,
            optimized.breakdown.category,
            optimized.final_score()
        );

        Ok(ContextUpdate::new()
            .metadata("ats_score", optimized.final_score())
            .optimized_record(optimized))
    }

    async fn render_document(&self, context: &RunContext) -> Result<ContextUpdate> {
        let profile = Self::require_profile(context)?;
        let aligned = Self::require_aligned(context)?;
        let optimized = context
            .optimized_record
            .as_ref()
            .ok_or_else(|| ResumeOptimizerError::InvalidInput("optimized record missing".to_string()))?;

        let merged = merge_layers(profile, aligned, optimized)?;
        let path = self.renderer.render(&merged, &self.template).await?;

        info!("Artifact written to {}", path.display());
        Ok(ContextUpdate::new().artifact_path(path))
    }

    fn require_job(context: &RunContext) -> Result<&JobRecord> {
        context
            .job_record
            .as_ref()
            .ok_or_else(|| ResumeOptimizerError::InvalidInput("job record missing".to_string()))
    }

    fn require_profile(context: &RunContext) -> Result<&ProfileRecord> {
        context
            .profile_record
            .as_ref()
            .ok_or_else(|| ResumeOptimizerError::InvalidInput("profile record missing".to_string()))
    }

    fn require_aligned(context: &RunContext) -> Result<&AlignedRecord> {
        context
            .aligned_record
            .as_ref()
            .ok_or_else(|| ResumeOptimizerError::InvalidInput("aligned record missing".to_string()))
    }

    /// Save the snapshot; a failure becomes a warning and never halts the run
    async fn persist(&self, context: &mut RunContext) {
        if let Err(e) = self.store.save(context).await {
            let message = format!("Failed to persist run context: {}", e);
            warn!("[{}] {}", context.run_id, message);
            context.warnings.push(message);
        }
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

/// Overlay profile, then aligned, then optimized; later layers win on key conflicts
pub fn merge_layers(
    profile: &ProfileRecord,
    aligned: &AlignedRecord,
    optimized: &OptimizedRecord,
) -> Result<Value> {
    let mut merged = Map::new();
    for layer in [
        serde_json::to_value(profile)?,
        serde_json::to_value(aligned)?,
        serde_json::to_value(optimized)?,
    ] {
        if let Value::Object(fields) = layer {
            merged.extend(fields);
        }
    }
    Ok(Value::Object(merged))
}
