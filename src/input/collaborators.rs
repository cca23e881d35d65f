//! Interfaces to the external services each pipeline stage relies on

use crate::error::Result;
use crate::processing::records::{JobRecord, ProfileMatch};
use serde_json::Value;
use std::path::PathBuf;

/// Turns a job posting location into a structured record
///
/// Implementations should be best-effort: a fetch or parse failure may be
/// reported either as `Err` or as a record whose `error` field is set.
pub trait JobExtractor {
    fn extract(&self, job_url: &str) -> impl std::future::Future<Output = Result<JobRecord>> + Send;
}

/// Finds the applicant content most relevant to a job
pub trait ProfileRetriever {
    fn retrieve(
        &self,
        job: &JobRecord,
        profile_id: &str,
    ) -> impl std::future::Future<Output = Result<ProfileMatch>> + Send;
}

/// Renders a merged resume record into an artifact on disk
pub trait DocumentRenderer {
    fn render(
        &self,
        record: &Value,
        template: &str,
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
}
