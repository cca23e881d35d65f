//! Record types flowing through the optimization pipeline
//!
//! Collaborators hand over loosely keyed documents; the serde aliases here
//! fold the alternate key names into one canonical shape at the boundary.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Structured job posting produced by a `JobExtractor`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(alias = "job_title", default)]
    pub title: String,
    #[serde(alias = "company_name", default)]
    pub company: Option<String>,
    #[serde(alias = "skills", default, deserialize_with = "string_or_list_set")]
    pub required_skills: BTreeSet<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub requirements: Vec<String>,
    #[serde(alias = "duties", default, deserialize_with = "string_or_list")]
    pub responsibilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Set by a best-effort extractor that could not produce a usable record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    pub fn with_error(source_url: &str, error: impl Into<String>) -> Self {
        Self {
            source_url: Some(source_url.to_string()),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(alias = "role", alias = "position", default)]
    pub title: String,
    #[serde(alias = "employer", default)]
    pub company: Option<String>,
    #[serde(alias = "year", alias = "dates", alias = "period", default)]
    pub duration: Option<String>,
    #[serde(alias = "details", alias = "summary", default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(alias = "title", default)]
    pub name: String,
    #[serde(alias = "details", default)]
    pub description: String,
    #[serde(alias = "tech_stack", alias = "stack", default, deserialize_with = "string_or_list")]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub degree: String,
    #[serde(alias = "major", default)]
    pub field: Option<String>,
    #[serde(alias = "school", alias = "university", default)]
    pub institution: String,
    #[serde(alias = "duration", alias = "graduation_year", default)]
    pub year: Option<String>,
    #[serde(alias = "cgpa", default)]
    pub gpa: Option<String>,
}

/// Applicant profile filtered down to what is relevant for one job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(alias = "profile_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "skills", default, deserialize_with = "string_or_list")]
    pub relevant_skills: Vec<String>,
    #[serde(alias = "experience", default)]
    pub relevant_experience: Vec<ExperienceEntry>,
    #[serde(alias = "projects", default)]
    pub relevant_projects: Vec<ProjectEntry>,
    #[serde(alias = "education", default)]
    pub relevant_education: Vec<EducationEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A profile together with the retriever's relevance indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMatch {
    pub profile: ProfileRecord,
    pub relevance: f32,
}

/// Job keywords per posting field, plus their union
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobKeywords {
    pub title: BTreeSet<String>,
    pub skills: BTreeSet<String>,
    pub requirements: BTreeSet<String>,
    pub responsibilities: BTreeSet<String>,
    pub all: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Technical,
    Tools,
    Soft,
    Other,
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkillCategory::Technical => write!(f, "Technical"),
            SkillCategory::Tools => write!(f, "Tools"),
            SkillCategory::Soft => write!(f, "Soft"),
            SkillCategory::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillAlignment {
    /// Applicant skills, most relevant first
    pub aligned_skills: Vec<String>,
    pub matching_skills: BTreeSet<String>,
    pub skill_scores: BTreeMap<String, f32>,
    pub alignment_score: f32,
    pub categories: BTreeMap<SkillCategory, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedExperience {
    #[serde(flatten)]
    pub entry: ExperienceEntry,
    pub alignment_score: f32,
    pub matching_keywords: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aligned_description: Option<String>,
}

/// Output of the content alignment stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    #[serde(default)]
    pub profile_id: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skill_alignment: SkillAlignment,
    #[serde(default)]
    pub ranked_experience: Vec<RankedExperience>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub overall_alignment_score: f32,
    #[serde(default)]
    pub experience_alignment_score: f32,
    #[serde(default)]
    pub job_keywords: JobKeywords,
    /// Job keywords that also appear in the applicant's skills
    #[serde(default)]
    pub matching_keywords: BTreeSet<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl AlignedRecord {
    /// The resume sections the ATS engine inspects
    pub fn sections(&self) -> ResumeSections {
        ResumeSections {
            summary: Some(self.summary.clone()),
            skills: Some(self.skill_alignment.aligned_skills.clone()),
            experience: Some(self.ranked_experience.clone()),
            education: Some(self.education.clone()),
        }
    }
}

/// Section view of a resume; `None` means the section was never produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSections {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub experience: Option<Vec<RankedExperience>>,
    #[serde(default)]
    pub education: Option<Vec<EducationEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Summary,
    Skills,
    Experience,
    Education,
}

impl SectionType {
    pub const REQUIRED: [SectionType; 4] = [
        SectionType::Summary,
        SectionType::Skills,
        SectionType::Experience,
        SectionType::Education,
    ];
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SectionType::Summary => write!(f, "Summary"),
            SectionType::Skills => write!(f, "Skills"),
            SectionType::Experience => write!(f, "Experience"),
            SectionType::Education => write!(f, "Education"),
        }
    }
}

impl ResumeSections {
    pub fn is_present(&self, section: SectionType) -> bool {
        match section {
            SectionType::Summary => self.summary.as_ref().is_some_and(|s| !s.trim().is_empty()),
            SectionType::Skills => self.skills.as_ref().is_some_and(|s| !s.is_empty()),
            SectionType::Experience => self.experience.as_ref().is_some_and(|e| !e.is_empty()),
            SectionType::Education => self.education.as_ref().is_some_and(|e| !e.is_empty()),
        }
    }

    /// Plain text of every section, one fragment per line
    pub fn to_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();

        if let Some(summary) = &self.summary {
            parts.push(summary);
        }
        if let Some(skills) = &self.skills {
            parts.extend(skills.iter().map(String::as_str));
        }
        if let Some(experience) = &self.experience {
            for exp in experience {
                parts.push(&exp.entry.title);
                parts.push(&exp.entry.description);
            }
        }
        if let Some(education) = &self.education {
            for edu in education {
                parts.push(&edu.degree);
                parts.push(edu.field.as_deref().unwrap_or(""));
                parts.push(&edu.institution);
            }
        }

        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreCategory {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ScoreCategory {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => ScoreCategory::Excellent,
            80..=89 => ScoreCategory::Good,
            70..=79 => ScoreCategory::Fair,
            _ => ScoreCategory::Poor,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            ScoreCategory::Excellent => "ATS Optimized",
            ScoreCategory::Good => "Minor Improvements Needed",
            ScoreCategory::Fair => "Moderate Improvements Needed",
            ScoreCategory::Poor => "Major Improvements Required",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScoreCategory::Poor => write!(f, "Poor"),
            ScoreCategory::Fair => write!(f, "Fair"),
            ScoreCategory::Good => write!(f, "Good"),
            ScoreCategory::Excellent => write!(f, "Excellent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionCategory {
    Keywords,
    Sections,
    Formatting,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub category: SuggestionCategory,
    pub priority: SuggestionPriority,
    pub issue: String,
    pub message: String,
    pub auto_fixable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoFixResult {
    pub fixed_record: ResumeSections,
    pub fixes_applied: Vec<String>,
    pub score_before: u8,
    pub score_after: u8,
    pub score_improvement: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ATSScoreBreakdown {
    pub keyword_score: u8,
    pub section_score: u8,
    pub formatting_score: u8,
    pub ats_score: u8,
    pub category: ScoreCategory,
    pub suggestions: Vec<Suggestion>,
    pub auto_fix: Option<AutoFixResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    /// matched / total before the density curve
    pub coverage: f64,
    pub density: f64,
    pub matching_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub total_job_keywords: usize,
    pub total_resume_keywords: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionAnalysis {
    pub present: Vec<SectionType>,
    pub missing: Vec<SectionType>,
    pub section_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    High,
    Medium,
    Low,
}

impl IssueSeverity {
    /// Issue units this severity contributes to the formatting penalty
    pub fn weight(&self) -> f64 {
        match self {
            IssueSeverity::High => 1.0,
            IssueSeverity::Medium => 0.5,
            IssueSeverity::Low => 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingIssue {
    pub rule: String,
    pub description: String,
    pub severity: IssueSeverity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormattingAnalysis {
    pub issues: Vec<FormattingIssue>,
    pub issue_units: f64,
    pub total_checks: usize,
    pub formatting_score: f64,
    pub ats_friendly: bool,
}

/// Output of the ATS scoring stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRecord {
    pub profile_id: String,
    pub job_title: String,
    pub breakdown: ATSScoreBreakdown,
    pub keyword_analysis: KeywordAnalysis,
    pub section_analysis: SectionAnalysis,
    pub formatting_analysis: FormattingAnalysis,
    pub target_score: u8,
    pub meets_target: bool,
    /// Final resume content: the auto-fixed sections when a fix was applied
    #[serde(flatten)]
    pub sections: ResumeSections,
}

impl OptimizedRecord {
    /// Score after auto-fix when one was applied, otherwise the initial score
    pub fn final_score(&self) -> u8 {
        self.breakdown
            .auto_fix
            .as_ref()
            .map(|fix| fix.score_after)
            .unwrap_or(self.breakdown.ats_score)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn into_vec(self) -> Vec<String> {
        match self {
            StringOrList::One(s) => s
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            StringOrList::Many(items) => items,
        }
    }
}

/// Accept either a comma-separated string or a list of strings
fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrList>::deserialize(deserializer)?
        .map(StringOrList::into_vec)
        .unwrap_or_default())
}

fn string_or_list_set<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    string_or_list(deserializer).map(|items| items.into_iter().collect())
}
