//! Content alignment between an applicant profile and a job posting

use crate::config::AlignmentConfig;
use crate::error::Result;
use crate::processing::keywords::KeywordExtractor;
use crate::processing::records::{
    AlignedRecord, ExperienceEntry, JobKeywords, JobRecord, ProfileRecord, RankedExperience,
    SkillAlignment, SkillCategory,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

const BUILD_IMPACT_CLAUSE: &str = " resulting in improved system performance and efficiency";
const LEAD_IMPACT_CLAUSE: &str = " leading to successful project delivery and team productivity gains";

const TECHNICAL_KEYWORDS: &[&str] = &[
    "python", "java", "javascript", "react", "node", "sql", "aws", "docker", "kubernetes",
];
const TOOL_KEYWORDS: &[&str] = &["git", "jenkins", "jira", "confluence", "slack", "trello"];
const SOFT_KEYWORDS: &[&str] = &["leadership", "communication", "teamwork", "problem", "analytical"];

/// Scores and annotates applicant content against job keywords
///
/// Holds no per-run state, so one instance can serve concurrent runs.
#[derive(Debug, Clone)]
pub struct AlignmentScorer {
    extractor: KeywordExtractor,
    skills_weight: f32,
    experience_weight: f32,
    max_ranked_experience: usize,
}

impl AlignmentScorer {
    pub fn new() -> Result<Self> {
        Self::from_config(&AlignmentConfig::default())
    }

    pub fn from_config(config: &AlignmentConfig) -> Result<Self> {
        Ok(Self {
            extractor: KeywordExtractor::new(config.min_keyword_length)?,
            skills_weight: config.skills_weight,
            experience_weight: config.experience_weight,
            max_ranked_experience: config.max_ranked_experience,
        })
    }

    /// Normalize each posting field separately; `all` is their union
    pub fn extract_job_keywords(&self, job: &JobRecord) -> JobKeywords {
        let title = self.extractor.normalize(&job.title);
        let skills = self.extractor.normalize_all(&job.required_skills);
        let requirements = self.extractor.normalize_all(&job.requirements);
        let responsibilities = self.extractor.normalize_all(&job.responsibilities);

        let all = title
            .iter()
            .chain(&skills)
            .chain(&requirements)
            .chain(&responsibilities)
            .cloned()
            .collect();

        JobKeywords {
            title,
            skills,
            requirements,
            responsibilities,
            all,
        }
    }

    /// Fraction of `keywords` found in `text`, capped at 1.0
    pub fn score(&self, text: &str, keywords: &BTreeSet<String>) -> f32 {
        if text.is_empty() || keywords.is_empty() {
            return 0.0;
        }

        let text_keywords = self.extractor.normalize(text);
        let matched = text_keywords.intersection(keywords).count();

        (matched as f32 / keywords.len() as f32).min(1.0)
    }

    /// Score, annotate, and rank experience entries; keeps the top entries only
    pub fn rank_experience(
        &self,
        entries: &[ExperienceEntry],
        keywords: &BTreeSet<String>,
    ) -> Vec<RankedExperience> {
        let mut ranked = self.score_experience(entries, keywords);
        ranked.truncate(self.max_ranked_experience);
        ranked
    }

    /// Score and annotate every experience entry, best first
    pub fn score_experience(
        &self,
        entries: &[ExperienceEntry],
        keywords: &BTreeSet<String>,
    ) -> Vec<RankedExperience> {
        let mut ranked: Vec<RankedExperience> = entries
            .iter()
            .map(|entry| {
                let title_score = self.score(&entry.title, keywords);
                let description_score = self.score(&entry.description, keywords);
                let alignment_score = (title_score + 2.0 * description_score) / 3.0;

                let combined = format!("{} {}", entry.title, entry.description);
                let matching_keywords: BTreeSet<String> = self
                    .extractor
                    .normalize(&combined)
                    .intersection(keywords)
                    .cloned()
                    .collect();

                let aligned_description = if !entry.description.is_empty() && !matching_keywords.is_empty() {
                    Some(Self::rewrite_description(&entry.description))
                } else {
                    None
                };

                RankedExperience {
                    entry: entry.clone(),
                    alignment_score,
                    matching_keywords,
                    aligned_description,
                }
            })
            .collect();

        // Stable sort keeps profile order among equal scores
        ranked.sort_by(|a, b| {
            b.alignment_score
                .partial_cmp(&a.alignment_score)
                .unwrap_or(Ordering::Equal)
        });
        ranked
    }

    /// Append an impact clause to descriptions that carry no figures
    pub fn rewrite_description(description: &str) -> String {
        if description.chars().any(|c| c.is_ascii_digit()) {
            return description.to_string();
        }

        let lowered = description.to_lowercase();
        if lowered.contains("developed") || lowered.contains("built") {
            format!("{}{}", description, BUILD_IMPACT_CLAUSE)
        } else if lowered.contains("managed") || lowered.contains("led") {
            format!("{}{}", description, LEAD_IMPACT_CLAUSE)
        } else {
            description.to_string()
        }
    }

    pub fn align_skills(&self, skills: &[String], keywords: &JobKeywords) -> SkillAlignment {
        if skills.is_empty() {
            return SkillAlignment::default();
        }

        let mut skill_scores = BTreeMap::new();
        let mut matching_skills = BTreeSet::new();

        for skill in skills {
            let score = self.score(skill, &keywords.all);
            if score > 0.0 {
                matching_skills.insert(skill.clone());
            }
            skill_scores.insert(skill.clone(), score);
        }

        let mut aligned_skills = skills.to_vec();
        aligned_skills.sort_by(|a, b| {
            let score_a = skill_scores.get(a).copied().unwrap_or(0.0);
            let score_b = skill_scores.get(b).copied().unwrap_or(0.0);
            score_b.partial_cmp(&score_a).unwrap_or(Ordering::Equal)
        });

        let mut categories: BTreeMap<SkillCategory, Vec<String>> = [
            SkillCategory::Technical,
            SkillCategory::Tools,
            SkillCategory::Soft,
            SkillCategory::Other,
        ]
        .into_iter()
        .map(|category| (category, Vec::new()))
        .collect();

        for skill in &aligned_skills {
            categories
                .entry(Self::categorize_skill(skill))
                .or_default()
                .push(skill.clone());
        }

        let alignment_score = skills
            .iter()
            .map(|s| skill_scores.get(s).copied().unwrap_or(0.0))
            .sum::<f32>()
            / skills.len() as f32;

        SkillAlignment {
            aligned_skills,
            matching_skills,
            skill_scores,
            alignment_score,
            categories,
        }
    }

    /// First matching list wins: technical, then tools, then soft
    pub fn categorize_skill(skill: &str) -> SkillCategory {
        let lowered = skill.to_lowercase();

        if TECHNICAL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            SkillCategory::Technical
        } else if TOOL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            SkillCategory::Tools
        } else if SOFT_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            SkillCategory::Soft
        } else {
            SkillCategory::Other
        }
    }

    /// Weighted combination of the skills score and the mean experience score
    pub fn overall_alignment(&self, skills_score: f32, experience_scores: &[f32]) -> f32 {
        let average_experience = if experience_scores.is_empty() {
            0.0
        } else {
            experience_scores.iter().sum::<f32>() / experience_scores.len() as f32
        };

        let total_weight = self.skills_weight + self.experience_weight;
        if total_weight <= 0.0 {
            return 0.0;
        }

        ((skills_score * self.skills_weight + average_experience * self.experience_weight) / total_weight)
            .clamp(0.0, 1.0)
    }

    pub fn generate_summary(&self, profile: &ProfileRecord, keywords: &JobKeywords) -> String {
        let years_experience = if profile.relevant_experience.is_empty() {
            3
        } else {
            profile.relevant_experience.len() * 2
        };

        let mut parts = Vec::new();

        let top_skills: Vec<&str> = profile
            .relevant_skills
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        if top_skills.is_empty() {
            parts.push(format!(
                "Experienced professional with {}+ years in the field",
                years_experience
            ));
        } else {
            parts.push(format!(
                "Experienced professional with {}+ years of expertise in {}",
                years_experience,
                top_skills.join(", ")
            ));
        }

        let has = |word: &str| keywords.all.contains(word);
        let focus = if (has("machine") && has("learning")) || has("ml") {
            "Specialized in developing and deploying machine learning solutions"
        } else if has("web") || has("frontend") {
            "Focused on building scalable web applications and user interfaces"
        } else if has("devops") || has("infrastructure") {
            "Expert in cloud infrastructure and DevOps practices"
        } else {
            "Proven track record of delivering high-quality technical solutions"
        };
        parts.push(focus.to_string());

        parts.push(
            "Demonstrated ability to work in collaborative environments and drive project success"
                .to_string(),
        );

        format!("{}.", parts.join(". "))
    }

    /// Run the full alignment of a profile against a job
    pub fn align(&self, job: &JobRecord, profile: &ProfileRecord) -> AlignedRecord {
        let job_keywords = self.extract_job_keywords(job);

        let skill_alignment = self.align_skills(&profile.relevant_skills, &job_keywords);

        // Averages cover every entry; only the output section is truncated
        let mut ranked_experience = self.score_experience(&profile.relevant_experience, &job_keywords.all);
        let experience_scores: Vec<f32> = ranked_experience.iter().map(|exp| exp.alignment_score).collect();
        let experience_alignment_score = if experience_scores.is_empty() {
            0.0
        } else {
            experience_scores.iter().sum::<f32>() / experience_scores.len() as f32
        };

        let overall_alignment_score =
            self.overall_alignment(skill_alignment.alignment_score, &experience_scores);

        let matching_keywords = self
            .extractor
            .normalize_all(&profile.relevant_skills)
            .intersection(&job_keywords.all)
            .cloned()
            .collect();

        let summary = self.generate_summary(profile, &job_keywords);
        let recommendations =
            Self::recommendations(overall_alignment_score, &skill_alignment, &experience_scores);

        ranked_experience.truncate(self.max_ranked_experience);

        AlignedRecord {
            profile_id: profile.id.clone(),
            job_title: job.title.clone(),
            summary,
            skill_alignment,
            ranked_experience,
            education: profile.relevant_education.clone(),
            projects: profile.relevant_projects.clone(),
            overall_alignment_score,
            experience_alignment_score,
            job_keywords,
            matching_keywords,
            recommendations,
        }
    }

    fn recommendations(
        overall_alignment: f32,
        skills: &SkillAlignment,
        experience_scores: &[f32],
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if overall_alignment < 0.3 {
            recommendations.push("Consider emphasizing more relevant skills and experiences".to_string());
        } else if overall_alignment < 0.6 {
            recommendations.push("Good alignment - consider quantifying achievements".to_string());
        } else {
            recommendations.push("Excellent alignment with job requirements".to_string());
        }

        if skills.alignment_score < 0.4 {
            recommendations.push("Add more technical skills that match job requirements".to_string());
        }

        if !experience_scores.iter().any(|score| *score > 0.5) {
            recommendations.push("Rephrase experience descriptions to better match job keywords".to_string());
        }

        if experience_scores.len() < 2 {
            recommendations.push("Include more relevant work experiences".to_string());
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn sample_job() -> JobRecord {
        JobRecord {
            title: "Senior Python Developer".to_string(),
            company: Some("Acme".to_string()),
            required_skills: ["Python", "Django", "AWS", "Docker", "PostgreSQL"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            requirements: vec!["Experience with web frameworks".to_string()],
            responsibilities: vec!["Design REST APIs".to_string()],
            ..JobRecord::default()
        }
    }

    fn experience(title: &str, description: &str) -> ExperienceEntry {
        ExperienceEntry {
            title: title.to_string(),
            description: description.to_string(),
            ..ExperienceEntry::default()
        }
    }

    #[test]
    fn test_extract_job_keywords_union() {
        let scorer = AlignmentScorer::new().unwrap();
        let kw = scorer.extract_job_keywords(&sample_job());

        assert_eq!(kw.title, keywords(&["developer", "python", "senior"]));
        assert!(kw.skills.contains("postgresql"));
        assert!(kw.requirements.contains("frameworks"));
        assert!(kw.responsibilities.contains("apis"));
        for category in [&kw.title, &kw.skills, &kw.requirements, &kw.responsibilities] {
            assert!(category.is_subset(&kw.all));
        }
    }

    #[test]
    fn test_score_fraction_and_empty_inputs() {
        let scorer = AlignmentScorer::new().unwrap();
        let kw = keywords(&["python", "django", "aws", "docker"]);

        assert!((scorer.score("Python and Django", &kw) - 0.5).abs() < 1e-6);
        assert_eq!(scorer.score("", &kw), 0.0);
        assert_eq!(scorer.score("Python", &BTreeSet::new()), 0.0);
        assert_eq!(scorer.score("python django aws docker extra", &kw), 1.0);
    }

    #[test]
    fn test_rank_experience_orders_and_truncates() {
        let scorer = AlignmentScorer::new().unwrap();
        let kw = keywords(&["python", "django", "aws"]);

        let mut entries = vec![experience("Chef", "Cooked meals")];
        entries.push(experience("Python Developer", "Built Django services on AWS"));
        for i in 0..5 {
            entries.push(experience(&format!("Role {}", i), "Python scripting"));
        }

        assert_eq!(scorer.score_experience(&entries, &kw).len(), 7);
        let ranked = scorer.rank_experience(&entries, &kw);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].entry.title, "Python Developer");
        assert!(ranked.windows(2).all(|w| w[0].alignment_score >= w[1].alignment_score));
        assert!(ranked.iter().all(|r| r.entry.title != "Chef"));

        let top = &ranked[0];
        assert_eq!(top.matching_keywords, keywords(&["aws", "django", "python"]));
        // title 1/3, description 2/3
        assert!((top.alignment_score - (1.0 / 3.0 + 4.0 / 3.0) / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_matching_keywords_subset_of_job_keywords() {
        let scorer = AlignmentScorer::new().unwrap();
        let kw = keywords(&["rust", "tokio"]);
        let ranked = scorer.rank_experience(&[experience("Rust Engineer", "Wrote async Rust with Tokio and Go")], &kw);

        assert!(ranked[0].matching_keywords.is_subset(&kw));
    }

    #[test]
    fn test_rewrite_description_rules() {
        assert_eq!(
            AlignmentScorer::rewrite_description("Developed a billing service"),
            format!("Developed a billing service{}", BUILD_IMPACT_CLAUSE)
        );
        assert_eq!(
            AlignmentScorer::rewrite_description("Managed the platform team"),
            format!("Managed the platform team{}", LEAD_IMPACT_CLAUSE)
        );
        assert_eq!(
            AlignmentScorer::rewrite_description("Built 3 pipelines"),
            "Built 3 pipelines"
        );
        assert_eq!(
            AlignmentScorer::rewrite_description("Wrote documentation"),
            "Wrote documentation"
        );
    }

    #[test]
    fn test_align_skills_sorting_and_categories() {
        let scorer = AlignmentScorer::new().unwrap();
        let kw = scorer.extract_job_keywords(&sample_job());
        let skills: Vec<String> = ["Leadership", "Git", "Python", "Django"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let alignment = scorer.align_skills(&skills, &kw);

        assert_eq!(alignment.matching_skills, keywords(&["Django", "Python"]));
        assert_eq!(&alignment.aligned_skills[..2], &["Python".to_string(), "Django".to_string()]);
        assert_eq!(alignment.categories[&SkillCategory::Technical], vec!["Python".to_string()]);
        assert_eq!(alignment.categories[&SkillCategory::Tools], vec!["Git".to_string()]);
        assert_eq!(alignment.categories[&SkillCategory::Soft], vec!["Leadership".to_string()]);
        assert_eq!(alignment.categories[&SkillCategory::Other], vec!["Django".to_string()]);
        assert!(alignment.alignment_score > 0.0 && alignment.alignment_score <= 1.0);
    }

    #[test]
    fn test_align_skills_empty() {
        let scorer = AlignmentScorer::new().unwrap();
        let alignment = scorer.align_skills(&[], &JobKeywords::default());
        assert!(alignment.aligned_skills.is_empty());
        assert_eq!(alignment.alignment_score, 0.0);
    }

    #[test]
    fn test_overall_alignment_weighting() {
        let scorer = AlignmentScorer::new().unwrap();
        let overall = scorer.overall_alignment(0.5, &[1.0, 0.0]);
        let expected = (0.5 * 1.2 + 0.5 * 1.5) / 2.7;
        assert!((overall - expected).abs() < 1e-6);
        assert_eq!(scorer.overall_alignment(0.0, &[]), 0.0);
    }

    #[test]
    fn test_align_full_record() {
        let scorer = AlignmentScorer::new().unwrap();
        let profile = ProfileRecord {
            id: "jane".to_string(),
            name: Some("Jane".to_string()),
            relevant_skills: vec!["Python".to_string(), "Django".to_string(), "Cooking".to_string()],
            relevant_experience: vec![
                experience("Python Developer", "Developed Django services on AWS"),
                experience("Barista", "Made coffee"),
            ],
            ..ProfileRecord::default()
        };

        let aligned = scorer.align(&sample_job(), &profile);

        assert_eq!(aligned.profile_id, "jane");
        assert_eq!(aligned.job_title, "Senior Python Developer");
        assert!((0.0..=1.0).contains(&aligned.overall_alignment_score));
        assert_eq!(aligned.ranked_experience[0].entry.title, "Python Developer");
        assert_eq!(
            aligned.ranked_experience[0].aligned_description.as_deref(),
            Some("Developed Django services on AWS resulting in improved system performance and efficiency")
        );
        assert!(aligned.ranked_experience[1].aligned_description.is_none());
        assert!(aligned.summary.starts_with("Experienced professional with 4+ years of expertise in Python, Django."));
        assert!(aligned.summary.ends_with('.'));
        assert_eq!(aligned.matching_keywords, keywords(&["django", "python"]));
        assert!(!aligned.recommendations.is_empty());
    }

    #[test]
    fn test_align_averages_every_experience_before_truncating() {
        let scorer = AlignmentScorer::new().unwrap();
        let job = JobRecord {
            title: "Python Django".to_string(),
            ..JobRecord::default()
        };
        let relevant_experience = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    experience("Python Django", "Python Django services")
                } else {
                    experience("Chef", "Cooked meals")
                }
            })
            .collect();
        let profile = ProfileRecord {
            id: "jane".to_string(),
            relevant_experience,
            ..ProfileRecord::default()
        };

        let aligned = scorer.align(&job, &profile);

        assert_eq!(aligned.ranked_experience.len(), 5);
        assert!(aligned.ranked_experience.iter().all(|exp| exp.alignment_score == 1.0));
        assert!((aligned.experience_alignment_score - 0.5).abs() < 1e-6);

        let skills_score = aligned.skill_alignment.alignment_score;
        let expected = (skills_score * 1.2 + 0.5 * 1.5) / 2.7;
        assert!((aligned.overall_alignment_score - expected).abs() < 1e-6);
        assert!(!aligned
            .recommendations
            .contains(&"Include more relevant work experiences".to_string()));
    }

    #[test]
    fn test_align_tolerates_empty_records() {
        let scorer = AlignmentScorer::new().unwrap();
        let aligned = scorer.align(&JobRecord::default(), &ProfileRecord::default());

        assert_eq!(aligned.overall_alignment_score, 0.0);
        assert!(aligned.ranked_experience.is_empty());
        assert!(aligned.summary.contains("3+ years in the field"));
    }
}
