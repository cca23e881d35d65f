//! Durable run-context snapshots, one JSON file per run id

use crate::error::{Result, ResumeOptimizerError};
use crate::workflow::context::{ContextUpdate, RunContext};
use chrono::Utc;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Last-write-wins store of `RunContext` snapshots under `base_dir/<run_id>.json`
///
/// No locking is performed: callers must not run two writers against the same id.
#[derive(Debug, Clone)]
pub struct ContextStore {
    base_dir: PathBuf,
}

impl ContextStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Fresh unique run id
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Create and persist a new context with a generated id
    pub async fn create(&self, job_url: &str, profile_id: &str) -> Result<RunContext> {
        self.create_with_id(&Self::generate_id(), job_url, profile_id).await
    }

    pub async fn create_with_id(&self, run_id: &str, job_url: &str, profile_id: &str) -> Result<RunContext> {
        let mut context = RunContext::new(run_id, job_url, profile_id);
        context
            .metadata
            .insert("created_at".to_string(), Utc::now().to_rfc3339().into());
        self.save(&context).await?;
        Ok(context)
    }

    pub async fn load(&self, run_id: &str) -> Result<RunContext> {
        let path = self.path(run_id)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ResumeOptimizerError::ContextNotFound(run_id.to_string()));
        }

        let content = fs::read_to_string(&path).await?;
        let context: RunContext = serde_json::from_str(&content)?;
        Ok(context)
    }

    /// Load, merge `update`, and write back the snapshot
    pub async fn update(&self, run_id: &str, update: ContextUpdate) -> Result<RunContext> {
        let mut context = self.load(run_id).await?;
        context.apply(update);
        self.save(&context).await?;
        Ok(context)
    }

    /// Overwrite the snapshot for `context.run_id`
    pub async fn save(&self, context: &RunContext) -> Result<()> {
        let path = self.path(&context.run_id)?;

        fs::create_dir_all(&self.base_dir).await.map_err(|e| {
            ResumeOptimizerError::Persistence(format!(
                "Failed to create context directory '{}': {}",
                self.base_dir.display(),
                e
            ))
        })?;

        let mut snapshot = context.clone();
        snapshot
            .metadata
            .insert("updated_at".to_string(), Utc::now().to_rfc3339().into());

        let content = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, content).await.map_err(|e| {
            ResumeOptimizerError::Persistence(format!("Failed to write context '{}': {}", path.display(), e))
        })?;

        debug!("Saved run context to {}", path.display());
        Ok(())
    }

    /// Ids of every stored run, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        if !fs::try_exists(&self.base_dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Snapshot location for `run_id`
    pub fn path(&self, run_id: &str) -> Result<PathBuf> {
        if !is_valid_run_id(run_id) {
            return Err(ResumeOptimizerError::InvalidInput(format!("Invalid run id: '{}'", run_id)));
        }
        Ok(self.base_dir.join(format!("{}.json", run_id)))
    }
}

/// Run ids become file names, so they may not contain path components
pub fn is_valid_run_id(run_id: &str) -> bool {
    !run_id.is_empty()
        && run_id != "."
        && run_id != ".."
        && !run_id.contains(['/', '\\'])
        && !run_id.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::records::JobRecord;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_generates_unique_ids() {
        let dir = TempDir::new().unwrap();
        let store = ContextStore::new(dir.path());

        let first = store.create("file:///a.json", "jane").await.unwrap();
        let second = store.create("file:///a.json", "jane").await.unwrap();

        assert_ne!(first.run_id, second.run_id);
        assert!(dir.path().join(format!("{}.json", first.run_id)).exists());
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_fields() {
        let dir = TempDir::new().unwrap();
        let store = ContextStore::new(dir.path());

        let mut context = store.create("file:///job.json", "jane").await.unwrap();
        context.apply(
            ContextUpdate::new()
                .job_record(JobRecord {
                    title: "Engineer".to_string(),
                    required_skills: ["Rust".to_string()].into_iter().collect(),
                    ..JobRecord::default()
                })
                .timing("extract_job", 1.25)
                .warning("low relevance"),
        );
        store.save(&context).await.unwrap();

        let loaded = store.load(&context.run_id).await.unwrap();
        assert_eq!(loaded.run_id, context.run_id);
        assert_eq!(loaded.job_url, context.job_url);
        assert_eq!(loaded.job_record, context.job_record);
        assert_eq!(loaded.execution_time, context.execution_time);
        assert_eq!(loaded.warnings, context.warnings);
        assert!(loaded.metadata.contains_key("updated_at"));
    }

    #[tokio::test]
    async fn test_float_timings_load_back_exactly() {
        let dir = TempDir::new().unwrap();
        let store = ContextStore::new(dir.path());
        let mut context = store.create_with_id("float-run", "url", "jane").await.unwrap();

        // xorshift64 over the unit interval, the shape of as_secs_f64 durations
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut update = ContextUpdate::new();
        for i in 0..2000 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let seconds = (state >> 11) as f64 / (1u64 << 53) as f64;
            update = update.timing(&format!("stage_{}", i), seconds);
        }
        update = update.metadata("profile_relevance", 0.104_940_354_630_094_99_f64);
        context.apply(update);
        store.save(&context).await.unwrap();

        let loaded = store.load("float-run").await.unwrap();
        assert_eq!(loaded.execution_time.len(), 2000);
        for (stage, seconds) in &context.execution_time {
            assert_eq!(loaded.execution_time[stage].to_bits(), seconds.to_bits(), "{}", stage);
        }
        assert_eq!(loaded.metadata["profile_relevance"], context.metadata["profile_relevance"]);
    }

    #[tokio::test]
    async fn test_update_merges_into_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = ContextStore::new(dir.path());
        let context = store.create("url", "jane").await.unwrap();

        store
            .update(&context.run_id, ContextUpdate::new().error("first"))
            .await
            .unwrap();
        let updated = store
            .update(&context.run_id, ContextUpdate::new().error("second").timing("total", 2.0))
            .await
            .unwrap();

        assert_eq!(updated.errors, vec!["first", "second"]);
        assert_eq!(store.load(&context.run_id).await.unwrap().errors.len(), 2);
        assert_eq!(updated.execution_time["total"], 2.0);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = ContextStore::new(dir.path());

        let err = store.load("does-not-exist").await.unwrap_err();
        assert!(matches!(err, ResumeOptimizerError::ContextNotFound(_)));
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let store = ContextStore::new(dir.path());

        assert!(store.path("../escape").is_err());
        assert!(store.path("a/b").is_err());
        assert!(store.path("").is_err());
        assert!(store.path("run-42").is_ok());
    }

    #[tokio::test]
    async fn test_list_returns_sorted_ids() {
        let dir = TempDir::new().unwrap();
        let store = ContextStore::new(dir.path().join("contexts"));

        assert!(store.list().await.unwrap().is_empty());
        store.create_with_id("b-run", "url", "jane").await.unwrap();
        store.create_with_id("a-run", "url", "jane").await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a-run", "b-run"]);
    }
}
