//! Job postings read from local files

use crate::error::{Result, ResumeOptimizerError};
use crate::input::collaborators::JobExtractor;
use crate::processing::records::JobRecord;
use log::{debug, info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;

const MAX_SKILLS: usize = 20;
const MAX_REQUIREMENTS: usize = 15;
const MAX_RESPONSIBILITIES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostingFormat {
    Json,
    Text,
    Markdown,
    Unknown,
}

impl PostingFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "json" => PostingFormat::Json,
            "txt" => PostingFormat::Text,
            "md" | "markdown" => PostingFormat::Markdown,
            _ => PostingFormat::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(PostingFormat::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PostingSection {
    Skills,
    Requirements,
    Responsibilities,
}

/// Reads `.json`, `.txt` and `.md` postings from `file://` URLs or bare paths
pub struct FileJobExtractor {
    bullet_regex: Regex,
    heading_regex: Regex,
    inline_regex: Regex,
}

impl FileJobExtractor {
    pub fn new() -> Result<Self> {
        let build = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| ResumeOptimizerError::Configuration(format!("Invalid posting pattern: {}", e)))
        };

        Ok(Self {
            bullet_regex: build(r"^\s*(?:[-*•]|\d+[.)])\s+(.+?)\s*$")?,
            heading_regex: build(r"^\s*(?:#+\s*)?([A-Za-z][A-Za-z '/&]{1,40}?)\s*:?\s*$")?,
            inline_regex: build(r"^\s*([A-Za-z][A-Za-z ]{1,30}):\s+(.+?)\s*$")?,
        })
    }

    /// Resolve a `file://` URL or bare path; `None` for network URLs
    pub fn resolve_path(job_url: &str) -> Option<PathBuf> {
        if let Some(path) = job_url.strip_prefix("file://") {
            return Some(PathBuf::from(path));
        }
        if job_url.starts_with("http://") || job_url.starts_with("https://") {
            return None;
        }
        Some(PathBuf::from(job_url))
    }

    /// Parse a plain-text or Markdown posting by its headings
    pub fn parse_text(&self, content: &str) -> JobRecord {
        let mut job = JobRecord::default();
        let mut current: Option<PostingSection> = None;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if job.title.is_empty() {
                job.title = trimmed.trim_start_matches('#').trim().to_string();
                continue;
            }

            if let Some(caps) = self.bullet_regex.captures(trimmed) {
                if let Some(section) = current {
                    self.push_item(&mut job, section, &caps[1]);
                }
                continue;
            }

            if let Some(caps) = self.inline_regex.captures(trimmed) {
                let label = caps[1].trim().to_lowercase();
                if label == "company" {
                    job.company = Some(caps[2].to_string());
                    continue;
                }
                if let Some(section) = Self::section_for(&label) {
                    for item in caps[2].split([',', ';']) {
                        self.push_item(&mut job, section, item);
                    }
                    current = Some(section);
                    continue;
                }
            }

            if let Some(caps) = self.heading_regex.captures(trimmed) {
                current = Self::section_for(&caps[1].trim().to_lowercase());
            }
        }

        job
    }

    fn push_item(&self, job: &mut JobRecord, section: PostingSection, item: &str) {
        let item = item.trim();
        if item.is_empty() {
            return;
        }

        match section {
            PostingSection::Skills => {
                if job.required_skills.len() < MAX_SKILLS {
                    job.required_skills.insert(item.to_string());
                }
            }
            PostingSection::Requirements => {
                if job.requirements.len() < MAX_REQUIREMENTS {
                    job.requirements.push(item.to_string());
                }
            }
            PostingSection::Responsibilities => {
                if job.responsibilities.len() < MAX_RESPONSIBILITIES {
                    job.responsibilities.push(item.to_string());
                }
            }
        }
    }

    fn section_for(label: &str) -> Option<PostingSection> {
        if label.contains("skill") || label.contains("technolog") || label == "tools" {
            Some(PostingSection::Skills)
        } else if label.contains("requirement") || label.contains("qualification") || label == "must have" {
            Some(PostingSection::Requirements)
        } else if label.contains("responsibilit") || label.contains("duties") || label.contains("what you") {
            Some(PostingSection::Responsibilities)
        } else {
            None
        }
    }

    async fn read_posting(&self, path: &Path) -> Result<JobRecord> {
        let content = fs::read_to_string(path).await?;

        match PostingFormat::from_path(path) {
            PostingFormat::Json => Ok(serde_json::from_str(&content)?),
            PostingFormat::Text | PostingFormat::Markdown => Ok(self.parse_text(&content)),
            PostingFormat::Unknown => Err(ResumeOptimizerError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl JobExtractor for FileJobExtractor {
    async fn extract(&self, job_url: &str) -> Result<JobRecord> {
        let Some(path) = Self::resolve_path(job_url) else {
            warn!("Network job postings are not fetched: {}", job_url);
            return Ok(JobRecord::with_error(job_url, "Failed to fetch page content"));
        };

        info!("Reading job posting: {}", path.display());
        match self.read_posting(&path).await {
            Ok(mut job) => {
                job.source_url = Some(job_url.to_string());
                debug!(
                    "Parsed posting '{}' with {} skills",
                    job.title,
                    job.required_skills.len()
                );
                Ok(job)
            }
            Err(ResumeOptimizerError::UnsupportedFormat(format)) => {
                Err(ResumeOptimizerError::UnsupportedFormat(format))
            }
            Err(e) => Ok(JobRecord::with_error(job_url, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const POSTING: &str = "\
# Senior Python Developer
Company: Acme Corp

## Required Skills
- Python
- Django, maybe
* AWS

## Requirements
1. 5+ years of backend experience
2. Strong SQL knowledge

## Key Responsibilities
- Design REST APIs
- Mentor junior engineers

## Benefits
- Free snacks
";

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            FileJobExtractor::resolve_path("file:///tmp/job.json"),
            Some(PathBuf::from("/tmp/job.json"))
        );
        assert_eq!(FileJobExtractor::resolve_path("jobs/a.md"), Some(PathBuf::from("jobs/a.md")));
        assert_eq!(FileJobExtractor::resolve_path("https://example.com/job"), None);
    }

    #[test]
    fn test_parse_text_by_headings() {
        let extractor = FileJobExtractor::new().unwrap();
        let job = extractor.parse_text(POSTING);

        assert_eq!(job.title, "Senior Python Developer");
        assert_eq!(job.company.as_deref(), Some("Acme Corp"));
        assert!(job.required_skills.contains("Python"));
        assert!(job.required_skills.contains("AWS"));
        assert_eq!(job.requirements.len(), 2);
        assert_eq!(job.responsibilities, vec!["Design REST APIs", "Mentor junior engineers"]);
        assert!(!job.responsibilities.iter().any(|r| r.contains("snacks")));
    }

    #[test]
    fn test_inline_skill_lists() {
        let extractor = FileJobExtractor::new().unwrap();
        let job = extractor.parse_text("Backend Engineer\nSkills: Rust, Tokio; PostgreSQL\n");

        assert_eq!(job.required_skills.len(), 3);
        assert!(job.required_skills.contains("Tokio"));
    }

    #[tokio::test]
    async fn test_extract_json_posting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(&path, r#"{"job_title": "Data Engineer", "skills": "Python, Spark"}"#).unwrap();

        let extractor = FileJobExtractor::new().unwrap();
        let url = format!("file://{}", path.display());
        let job = extractor.extract(&url).await.unwrap();

        assert_eq!(job.title, "Data Engineer");
        assert_eq!(job.required_skills.len(), 2);
        assert_eq!(job.source_url.as_deref(), Some(url.as_str()));
        assert!(job.error.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_yields_error_record() {
        let extractor = FileJobExtractor::new().unwrap();
        let job = extractor.extract("/definitely/not/here.json").await.unwrap();

        assert!(job.error.is_some());
    }

    #[tokio::test]
    async fn test_network_url_yields_error_record() {
        let extractor = FileJobExtractor::new().unwrap();
        let job = extractor.extract("https://example.com/jobs/1").await.unwrap();

        assert_eq!(job.error.as_deref(), Some("Failed to fetch page content"));
    }

    #[tokio::test]
    async fn test_unknown_extension_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.pdf");
        std::fs::write(&path, "binary").unwrap();

        let extractor = FileJobExtractor::new().unwrap();
        let err = extractor.extract(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, ResumeOptimizerError::UnsupportedFormat(_)));
    }
}
