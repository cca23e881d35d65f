//! Collaborator interfaces and their file-backed implementations
//! Job postings and applicant profiles are read from disk and normalized once here

pub mod collaborators;
pub mod job_extractor;
pub mod profile_store;

pub use collaborators::{DocumentRenderer, JobExtractor, ProfileRetriever};
pub use job_extractor::FileJobExtractor;
pub use profile_store::FileProfileRetriever;
