//! Applicant profiles stored as `<profile_id>.json` files

use crate::error::{Result, ResumeOptimizerError};
use crate::input::collaborators::ProfileRetriever;
use crate::processing::keywords::{KeywordExtractor, DEFAULT_MIN_KEYWORD_LENGTH};
use crate::processing::records::{JobRecord, ProfileMatch, ProfileRecord};
use log::{debug, info};
use std::path::PathBuf;
use strsim::jaro_winkler;
use tokio::fs;

const SKILL_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Loads a profile and keeps only the content relevant to a job
pub struct FileProfileRetriever {
    profiles_dir: PathBuf,
    extractor: KeywordExtractor,
}

impl FileProfileRetriever {
    pub fn new(profiles_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            profiles_dir: profiles_dir.into(),
            extractor: KeywordExtractor::new(DEFAULT_MIN_KEYWORD_LENGTH)?,
        })
    }

    pub async fn load_profile(&self, profile_id: &str) -> Result<ProfileRecord> {
        let path = self.profiles_dir.join(format!("{}.json", profile_id));
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ResumeOptimizerError::ProfileNotFound(profile_id.to_string()));
        }

        let content = fs::read_to_string(&path).await?;
        let mut profile: ProfileRecord = serde_json::from_str(&content)?;
        if profile.id.is_empty() {
            profile.id = profile_id.to_string();
        }
        Ok(profile)
    }

    /// Keep skills, experience and projects that mention the job's skills or phrases
    pub fn filter_relevant(&self, profile: &ProfileRecord, job: &JobRecord) -> ProfileRecord {
        let job_skills: Vec<String> = job.required_skills.iter().map(|s| s.to_lowercase()).collect();
        let terms: Vec<String> = job_skills
            .iter()
            .cloned()
            .chain(job.requirements.iter().map(|r| r.to_lowercase()))
            .chain(job.responsibilities.iter().map(|r| r.to_lowercase()))
            .filter(|term| !term.is_empty())
            .collect();

        let mentions = |text: &str| {
            let text = text.to_lowercase();
            terms.iter().any(|term| text.contains(term.as_str()))
        };

        let relevant_skills = profile
            .relevant_skills
            .iter()
            .filter(|skill| Self::skill_matches(skill, &job_skills))
            .cloned()
            .collect();

        let relevant_experience = profile
            .relevant_experience
            .iter()
            .filter(|exp| mentions(&format!("{} {}", exp.title, exp.description)))
            .cloned()
            .collect();

        let relevant_projects = profile
            .relevant_projects
            .iter()
            .filter(|project| {
                mentions(&format!(
                    "{} {} {}",
                    project.name,
                    project.description,
                    project.technologies.join(" ")
                ))
            })
            .cloned()
            .collect();

        ProfileRecord {
            id: profile.id.clone(),
            name: profile.name.clone(),
            relevant_skills,
            relevant_experience,
            relevant_projects,
            relevant_education: profile.relevant_education.clone(),
            error: None,
        }
    }

    fn skill_matches(skill: &str, job_skills: &[String]) -> bool {
        let skill = skill.to_lowercase();
        job_skills.iter().any(|job_skill| {
            skill.contains(job_skill.as_str()) || jaro_winkler(&skill, job_skill) >= SKILL_SIMILARITY_THRESHOLD
        })
    }

    /// Token overlap between the whole profile and the posting
    pub fn relevance(&self, profile: &ProfileRecord, job: &JobRecord) -> f32 {
        let mut profile_text: Vec<String> = profile.relevant_skills.clone();
        for exp in &profile.relevant_experience {
            profile_text.push(exp.title.clone());
            profile_text.push(exp.description.clone());
        }
        for project in &profile.relevant_projects {
            profile_text.push(project.name.clone());
            profile_text.push(project.description.clone());
            profile_text.extend(project.technologies.iter().cloned());
        }

        let mut job_text: Vec<String> = vec![job.title.clone()];
        job_text.extend(job.required_skills.iter().cloned());
        job_text.extend(job.requirements.iter().cloned());
        job_text.extend(job.responsibilities.iter().cloned());

        self.extractor.jaccard(&profile_text.join(" "), &job_text.join(" "))
    }
}

impl ProfileRetriever for FileProfileRetriever {
    async fn retrieve(&self, job: &JobRecord, profile_id: &str) -> Result<ProfileMatch> {
        info!("Loading profile '{}' from {}", profile_id, self.profiles_dir.display());
        let profile = self.load_profile(profile_id).await?;

        let relevance = self.relevance(&profile, job);
        let filtered = self.filter_relevant(&profile, job);
        debug!(
            "Profile '{}': {} of {} skills, {} of {} experiences relevant (relevance {:.2})",
            profile_id,
            filtered.relevant_skills.len(),
            profile.relevant_skills.len(),
            filtered.relevant_experience.len(),
            profile.relevant_experience.len(),
            relevance
        );

        Ok(ProfileMatch {
            profile: filtered,
            relevance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::records::{ExperienceEntry, ProjectEntry};
    use tempfile::TempDir;

    fn job() -> JobRecord {
        JobRecord {
            title: "Python Developer".to_string(),
            required_skills: ["Python".to_string(), "PostgreSQL".to_string()].into_iter().collect(),
            requirements: vec!["REST APIs".to_string()],
            ..JobRecord::default()
        }
    }

    fn profile() -> ProfileRecord {
        ProfileRecord {
            id: "jane".to_string(),
            relevant_skills: vec!["Python 3".to_string(), "Postgresql".to_string(), "Painting".to_string()],
            relevant_experience: vec![
                ExperienceEntry {
                    title: "Backend Engineer".to_string(),
                    description: "Built REST APIs in Python".to_string(),
                    ..ExperienceEntry::default()
                },
                ExperienceEntry {
                    title: "Barista".to_string(),
                    description: "Served coffee".to_string(),
                    ..ExperienceEntry::default()
                },
            ],
            relevant_projects: vec![ProjectEntry {
                name: "Ledger".to_string(),
                description: "Accounting tool".to_string(),
                technologies: vec!["PostgreSQL".to_string()],
            }],
            ..ProfileRecord::default()
        }
    }

    #[test]
    fn test_filter_relevant_content() {
        let retriever = FileProfileRetriever::new("unused").unwrap();
        let filtered = retriever.filter_relevant(&profile(), &job());

        assert_eq!(filtered.relevant_skills, vec!["Python 3", "Postgresql"]);
        assert_eq!(filtered.relevant_experience.len(), 1);
        assert_eq!(filtered.relevant_experience[0].title, "Backend Engineer");
        assert_eq!(filtered.relevant_projects.len(), 1);
    }

    #[test]
    fn test_relevance_in_unit_range() {
        let retriever = FileProfileRetriever::new("unused").unwrap();
        let relevance = retriever.relevance(&profile(), &job());
        assert!(relevance > 0.0 && relevance <= 1.0);
        assert_eq!(retriever.relevance(&ProfileRecord::default(), &JobRecord::default()), 0.0);
    }

    #[tokio::test]
    async fn test_retrieve_from_file_with_aliases() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("jane.json"),
            r#"{
                "name": "Jane",
                "skills": ["Python", "Django"],
                "experience": [{"role": "Developer", "details": "Python services"}],
                "education": [{"degree": "BSc", "school": "State", "cgpa": "3.8"}]
            }"#,
        )
        .unwrap();

        let retriever = FileProfileRetriever::new(dir.path()).unwrap();
        let found = retriever.retrieve(&job(), "jane").await.unwrap();

        assert_eq!(found.profile.id, "jane");
        assert_eq!(found.profile.relevant_skills, vec!["Python"]);
        assert_eq!(found.profile.relevant_experience.len(), 1);
        assert_eq!(found.profile.relevant_education[0].gpa.as_deref(), Some("3.8"));
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_found() {
        let dir = TempDir::new().unwrap();
        let retriever = FileProfileRetriever::new(dir.path()).unwrap();

        let err = retriever.retrieve(&job(), "ghost").await.unwrap_err();
        assert!(matches!(err, ResumeOptimizerError::ProfileNotFound(_)));
    }
}
