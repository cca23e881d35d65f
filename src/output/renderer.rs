//! Rendered resume artifacts written to the output directory

use crate::error::{Result, ResumeOptimizerError};
use crate::input::collaborators::DocumentRenderer;
use crate::processing::records::{ATSScoreBreakdown, EducationEntry, ProjectEntry, RankedExperience};
use chrono::Local;
use log::info;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Template {
    Markdown,
    Json,
}

impl Template {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Template::Markdown),
            "json" => Ok(Template::Json),
            other => Err(ResumeOptimizerError::Rendering(format!("Unknown template: '{}'", other))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Template::Markdown => "md",
            Template::Json => "json",
        }
    }
}

/// Typed view of the merged resume record; every field is optional
#[derive(Debug, Default, Deserialize)]
struct ResumeDocument {
    #[serde(default)]
    id: String,
    #[serde(default)]
    profile_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    job_title: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    skills: Option<Vec<String>>,
    #[serde(default)]
    experience: Option<Vec<RankedExperience>>,
    #[serde(default)]
    education: Option<Vec<EducationEntry>>,
    #[serde(default)]
    projects: Vec<ProjectEntry>,
    #[serde(default)]
    breakdown: Option<ATSScoreBreakdown>,
}

impl ResumeDocument {
    fn owner_id(&self) -> &str {
        if self.profile_id.is_empty() {
            &self.id
        } else {
            &self.profile_id
        }
    }
}

pub struct FileDocumentRenderer {
    output_dir: PathBuf,
}

impl FileDocumentRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// `{profile_id}_{job_title}_{YYYYMMDD_HHMMSS}` with unsafe characters replaced
    pub fn artifact_stem(profile_id: &str, job_title: &str, timestamp: &str) -> String {
        let profile = sanitize(profile_id);
        let title = sanitize(job_title);
        format!(
            "{}_{}_{}",
            if profile.is_empty() { "resume" } else { &profile },
            if title.is_empty() { "position" } else { &title },
            timestamp
        )
    }

    fn render_markdown(doc: &ResumeDocument) -> String {
        let mut output = String::new();

        let heading = doc.name.as_deref().unwrap_or(doc.owner_id());
        output.push_str(&format!("# {}\n\n", heading));
        if !doc.job_title.is_empty() {
            output.push_str(&format!("**Target role:** {}\n\n", doc.job_title));
        }

        if let Some(summary) = doc.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            output.push_str("## Summary\n\n");
            output.push_str(summary.trim());
            output.push_str("\n\n");
        }

        if let Some(skills) = doc.skills.as_ref().filter(|s| !s.is_empty()) {
            output.push_str("## Skills\n\n");
            output.push_str(&skills.join(", "));
            output.push_str("\n\n");
        }

        if let Some(experience) = doc.experience.as_ref().filter(|e| !e.is_empty()) {
            output.push_str("## Experience\n\n");
            for exp in experience {
                let mut line = format!("### {}", exp.entry.title);
                if let Some(company) = &exp.entry.company {
                    line.push_str(&format!(" - {}", company));
                }
                if let Some(duration) = &exp.entry.duration {
                    line.push_str(&format!(" ({})", duration));
                }
                output.push_str(&line);
                output.push_str("\n\n");

                let description = exp.aligned_description.as_deref().unwrap_or(&exp.entry.description);
                if !description.is_empty() {
                    output.push_str(&format!("- {}\n\n", description));
                }
            }
        }

        if !doc.projects.is_empty() {
            output.push_str("## Projects\n\n");
            for project in &doc.projects {
                output.push_str(&format!("- **{}**", project.name));
                if !project.description.is_empty() {
                    output.push_str(&format!(": {}", project.description));
                }
                if !project.technologies.is_empty() {
                    output.push_str(&format!(" ({})", project.technologies.join(", ")));
                }
                output.push('\n');
            }
            output.push('\n');
        }

        if let Some(education) = doc.education.as_ref().filter(|e| !e.is_empty()) {
            output.push_str("## Education\n\n");
            for edu in education {
                let mut line = format!("- {}", edu.degree);
                if let Some(field) = &edu.field {
                    line.push_str(&format!(" in {}", field));
                }
                if !edu.institution.is_empty() {
                    line.push_str(&format!(", {}", edu.institution));
                }
                if let Some(year) = &edu.year {
                    line.push_str(&format!(" ({})", year));
                }
                if let Some(gpa) = &edu.gpa {
                    line.push_str(&format!(", GPA {}", gpa));
                }
                output.push_str(&line);
                output.push('\n');
            }
            output.push('\n');
        }

        if let Some(breakdown) = &doc.breakdown {
            output.push_str(&format!(
                "<!-- ATS score: {} ({}) -->\n",
                breakdown.ats_score, breakdown.category
            ));
        }

        output
    }

    async fn write_new(&self, stem: &str, extension: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).await?;

        // Runs finishing within the same second get a numeric suffix
        for attempt in 0..100u32 {
            let file_name = if attempt == 0 {
                format!("{}.{}", stem, extension)
            } else {
                format!("{}_{}.{}", stem, attempt, extension)
            };
            let path = self.output_dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(content.as_bytes()).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ResumeOptimizerError::Rendering(format!(
            "Could not find a free file name for '{}'",
            stem
        )))
    }
}

impl DocumentRenderer for FileDocumentRenderer {
    async fn render(&self, record: &Value, template: &str) -> Result<PathBuf> {
        let template = Template::parse(template)?;
        let doc: ResumeDocument = serde_json::from_value(record.clone())
            .map_err(|e| ResumeOptimizerError::Rendering(format!("Malformed resume record: {}", e)))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let stem = Self::artifact_stem(doc.owner_id(), &doc.job_title, &timestamp);

        let content = match template {
            Template::Markdown => Self::render_markdown(&doc),
            Template::Json => serde_json::to_string_pretty(record)?,
        };

        let path = self.write_new(&stem, template.extension(), &content).await?;
        info!("Rendered resume to {}", path.display());
        Ok(path)
    }
}

fn sanitize(value: &str) -> String {
    value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn merged_record() -> Value {
        json!({
            "id": "jane",
            "name": "Jane Doe",
            "profile_id": "jane",
            "job_title": "Senior Python Developer",
            "summary": "Experienced professional.",
            "skills": ["Python", "Django"],
            "experience": [{
                "title": "Backend Engineer",
                "company": "Acme",
                "description": "Built APIs",
                "aligned_description": "Built APIs resulting in improved system performance and efficiency",
                "alignment_score": 0.8,
                "matching_keywords": ["apis"]
            }],
            "education": [{"degree": "BSc", "field": "Computer Science", "institution": "State University"}],
            "projects": [{"name": "Ledger", "description": "Accounting tool", "technologies": ["Rust"]}]
        })
    }

    #[test]
    fn test_artifact_stem_is_sanitized() {
        let stem = FileDocumentRenderer::artifact_stem("jane", "Senior C++ / Rust Dev", "20240101_120000");
        assert_eq!(stem, "jane_Senior_C_Rust_Dev_20240101_120000");
        assert_eq!(
            FileDocumentRenderer::artifact_stem("", "", "20240101_120000"),
            "resume_position_20240101_120000"
        );
    }

    #[test]
    fn test_unknown_template_is_rendering_error() {
        assert!(matches!(Template::parse("latex"), Err(ResumeOptimizerError::Rendering(_))));
        assert_eq!(Template::parse("Markdown").unwrap(), Template::Markdown);
    }

    #[tokio::test]
    async fn test_render_markdown() {
        let dir = TempDir::new().unwrap();
        let renderer = FileDocumentRenderer::new(dir.path());

        let path = renderer.render(&merged_record(), "markdown").await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("jane_Senior_Python_Developer_"));
        assert!(name.ends_with(".md"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Jane Doe"));
        assert!(content.contains("## Skills\n\nPython, Django"));
        assert!(content.contains("improved system performance"));
        assert!(content.contains("- BSc in Computer Science, State University"));
        assert!(content.contains("**Ledger**: Accounting tool (Rust)"));
    }

    #[tokio::test]
    async fn test_render_json_twice_gets_distinct_paths() {
        let dir = TempDir::new().unwrap();
        let renderer = FileDocumentRenderer::new(dir.path());

        let first = renderer.render(&merged_record(), "json").await.unwrap();
        let second = renderer.render(&merged_record(), "json").await.unwrap();

        assert_ne!(first, second);
        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&first).unwrap()).unwrap();
        assert_eq!(parsed["job_title"], "Senior Python Developer");
    }
}
