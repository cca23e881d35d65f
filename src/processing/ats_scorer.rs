//! ATS compatibility scoring with a single-pass auto-fix

use crate::config::AtsConfig;
use crate::error::{Result, ResumeOptimizerError};
use crate::processing::keywords::{KeywordExtractor, DEFAULT_MIN_KEYWORD_LENGTH};
use crate::processing::records::{
    ATSScoreBreakdown, AlignedRecord, AutoFixResult, FormattingAnalysis, FormattingIssue,
    IssueSeverity, KeywordAnalysis, OptimizedRecord, ResumeSections, ScoreCategory,
    SectionAnalysis, SectionType, Suggestion, SuggestionCategory, SuggestionPriority,
};
use aho_corasick::AhoCorasick;
use log::debug;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// Number of formatting rules a resume is judged against
pub const TOTAL_FORMATTING_CHECKS: usize = 7;

const IMAGE_MARKERS: &[&str] = &["[image]", "[graphic]", "[photo]", "img:", "src="];
const TABLE_MARKERS: &[&str] = &["|", "\t\t", "  \t"];

const SPECIAL_CHAR_RATIO: f64 = 0.05;
const LONG_LINE_CHARS: usize = 100;
const LONG_LINE_RATIO: f64 = 0.30;

const MAX_SUGGESTED_KEYWORDS: usize = 10;
const MAX_SUMMARY_KEYWORDS: usize = 5;
const MAX_SKILL_KEYWORDS: usize = 10;
const MAX_MISSING_FOR_ENRICHMENT: usize = 20;

const SUMMARY_PLACEHOLDER: &str = "Professional with relevant experience and skills.";

pub struct ATSScoringEngine {
    extractor: KeywordExtractor,
    keyword_weight: f64,
    section_weight: f64,
    formatting_weight: f64,
    target_score: u8,
    min_keyword_density: f64,
    image_matcher: AhoCorasick,
    table_matcher: AhoCorasick,
    special_char_regex: Regex,
}

impl ATSScoringEngine {
    pub fn new() -> Result<Self> {
        Self::from_config(&AtsConfig::default())
    }

    pub fn from_config(config: &AtsConfig) -> Result<Self> {
        let image_matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(IMAGE_MARKERS)
            .map_err(|e| ResumeOptimizerError::Configuration(format!("Failed to build image matcher: {}", e)))?;

        let table_matcher = AhoCorasick::builder()
            .build(TABLE_MARKERS)
            .map_err(|e| ResumeOptimizerError::Configuration(format!("Failed to build table matcher: {}", e)))?;

        let special_char_regex = Regex::new(r"[^\w\s\-\.,\(\)\[\]]")
            .map_err(|e| ResumeOptimizerError::Configuration(format!("Invalid special character pattern: {}", e)))?;

        Ok(Self {
            extractor: KeywordExtractor::new(DEFAULT_MIN_KEYWORD_LENGTH)?,
            keyword_weight: config.keyword_weight,
            section_weight: config.section_weight,
            formatting_weight: config.formatting_weight,
            target_score: config.target_score,
            min_keyword_density: config.min_keyword_density,
            image_matcher,
            table_matcher,
            special_char_regex,
        })
    }

    /// Forgiving density curve over the raw coverage ratio
    pub fn keyword_density(matched: usize, total: usize) -> f64 {
        if total == 0 || matched >= total {
            return 1.0;
        }

        let raw = matched as f64 / total as f64;
        let density = if raw >= 0.70 {
            0.95 + (raw - 0.70) * 0.15
        } else if raw >= 0.60 {
            0.90 + (raw - 0.60) * 0.50
        } else if raw >= 0.50 {
            0.85 + (raw - 0.50) * 0.50
        } else if raw >= 0.40 {
            0.75 + (raw - 0.40) * 1.00
        } else {
            raw * 1.875
        };

        density.min(1.0)
    }

    pub fn section_score(present: usize) -> f64 {
        match present {
            p if p >= 4 => 1.0,
            3 => 0.95,
            p => 0.85 + (p as f64 / 4.0) * 0.10,
        }
    }

    pub fn formatting_score(issue_units: f64) -> f64 {
        if issue_units <= 0.0 {
            1.0
        } else if issue_units <= 1.0 {
            0.95
        } else if issue_units <= 2.0 {
            0.90
        } else {
            (1.0 - issue_units / TOTAL_FORMATTING_CHECKS as f64 * 0.15).max(0.85)
        }
    }

    pub fn analyze_keywords(&self, sections: &ResumeSections, job_keywords: &BTreeSet<String>) -> KeywordAnalysis {
        let resume_keywords = self.extractor.normalize(&sections.to_text());

        let matching_keywords: Vec<String> = job_keywords.intersection(&resume_keywords).cloned().collect();
        let missing_keywords: Vec<String> = job_keywords.difference(&resume_keywords).cloned().collect();

        let coverage = if job_keywords.is_empty() {
            1.0
        } else {
            matching_keywords.len() as f64 / job_keywords.len() as f64
        };

        KeywordAnalysis {
            coverage,
            density: Self::keyword_density(matching_keywords.len(), job_keywords.len()),
            matching_keywords,
            missing_keywords,
            total_job_keywords: job_keywords.len(),
            total_resume_keywords: resume_keywords.len(),
        }
    }

    pub fn analyze_sections(&self, sections: &ResumeSections) -> SectionAnalysis {
        let (present, missing): (Vec<SectionType>, Vec<SectionType>) = SectionType::REQUIRED
            .into_iter()
            .partition(|section| sections.is_present(*section));

        SectionAnalysis {
            section_score: Self::section_score(present.len()),
            present,
            missing,
        }
    }

    pub fn analyze_formatting(&self, sections: &ResumeSections) -> FormattingAnalysis {
        let text = sections.to_text();
        let mut issues = Vec::new();

        if self.image_matcher.is_match(text.as_str()) {
            issues.push(FormattingIssue {
                rule: "no_images".to_string(),
                description: "Resume should not contain images or graphics".to_string(),
                severity: IssueSeverity::High,
            });
        }

        if self.table_matcher.is_match(text.as_str()) {
            issues.push(FormattingIssue {
                rule: "no_tables".to_string(),
                description: "Avoid complex tables that may not parse correctly".to_string(),
                severity: IssueSeverity::Medium,
            });
        }

        let special_chars = self.special_char_regex.find_iter(&text).count();
        if special_chars as f64 > text.chars().count() as f64 * SPECIAL_CHAR_RATIO {
            issues.push(FormattingIssue {
                rule: "simple_formatting".to_string(),
                description: "Use simple bullet points and standard formatting".to_string(),
                severity: IssueSeverity::Medium,
            });
        }

        let lines: Vec<&str> = text.split('\n').collect();
        let long_lines = lines.iter().filter(|line| line.chars().count() > LONG_LINE_CHARS).count();
        if long_lines as f64 > lines.len() as f64 * LONG_LINE_RATIO {
            issues.push(FormattingIssue {
                rule: "standard_formatting".to_string(),
                description: "Lines are too long, may indicate formatting issues".to_string(),
                severity: IssueSeverity::Low,
            });
        }

        let issue_units: f64 = issues.iter().map(|issue| issue.severity.weight()).sum();

        FormattingAnalysis {
            ats_friendly: issues.is_empty(),
            formatting_score: Self::formatting_score(issue_units),
            issues,
            issue_units,
            total_checks: TOTAL_FORMATTING_CHECKS,
        }
    }

    /// Weighted composite, rounded and clamped into 0..=100
    pub fn composite_score(&self, density: f64, section: f64, formatting: f64) -> u8 {
        let weighted =
            self.keyword_weight * density + self.section_weight * section + self.formatting_weight * formatting;
        to_percent(weighted)
    }

    /// Score a set of sections without attempting any fixes
    pub fn score(&self, sections: &ResumeSections, job_keywords: &BTreeSet<String>) -> ATSScoreBreakdown {
        let keywords = self.analyze_keywords(sections, job_keywords);
        let section_analysis = self.analyze_sections(sections);
        let formatting = self.analyze_formatting(sections);
        self.breakdown(&keywords, &section_analysis, &formatting)
    }

    fn breakdown(
        &self,
        keywords: &KeywordAnalysis,
        sections: &SectionAnalysis,
        formatting: &FormattingAnalysis,
    ) -> ATSScoreBreakdown {
        let ats_score = self.composite_score(keywords.density, sections.section_score, formatting.formatting_score);

        ATSScoreBreakdown {
            keyword_score: to_percent(keywords.density),
            section_score: to_percent(sections.section_score),
            formatting_score: to_percent(formatting.formatting_score),
            ats_score,
            category: ScoreCategory::from_score(ats_score),
            suggestions: self.suggestions(ats_score, keywords, sections, formatting),
            auto_fix: None,
        }
    }

    pub fn suggestions(
        &self,
        ats_score: u8,
        keywords: &KeywordAnalysis,
        sections: &SectionAnalysis,
        formatting: &FormattingAnalysis,
    ) -> Vec<Suggestion> {
        let mut suggestions = Vec::new();

        if keywords.coverage < self.min_keyword_density && !keywords.missing_keywords.is_empty() {
            let top_missing: Vec<&str> = keywords
                .missing_keywords
                .iter()
                .take(MAX_SUGGESTED_KEYWORDS)
                .map(String::as_str)
                .collect();
            suggestions.push(Suggestion {
                category: SuggestionCategory::Keywords,
                priority: SuggestionPriority::High,
                issue: format!("Low keyword density ({:.1}%)", keywords.coverage * 100.0),
                message: format!("Add these missing keywords: {}", top_missing.join(", ")),
                auto_fixable: true,
            });
        }

        for section in &sections.missing {
            suggestions.push(Suggestion {
                category: SuggestionCategory::Sections,
                priority: SuggestionPriority::High,
                issue: format!("Missing required section: {}", section),
                message: format!("Add a {} section with relevant content", section),
                auto_fixable: true,
            });
        }

        for issue in &formatting.issues {
            let high = issue.severity == IssueSeverity::High;
            suggestions.push(Suggestion {
                category: SuggestionCategory::Formatting,
                priority: if high { SuggestionPriority::High } else { SuggestionPriority::Medium },
                issue: issue.description.clone(),
                message: format!("Fix {} issue", issue.rule.replace('_', " ")),
                auto_fixable: !high,
            });
        }

        if ats_score < 70 {
            suggestions.push(Suggestion {
                category: SuggestionCategory::General,
                priority: SuggestionPriority::High,
                issue: "Overall ATS score is low".to_string(),
                message: "Focus on adding relevant keywords and ensuring all required sections are present"
                    .to_string(),
                auto_fixable: false,
            });
        } else if ats_score < 90 {
            suggestions.push(Suggestion {
                category: SuggestionCategory::General,
                priority: SuggestionPriority::Medium,
                issue: "ATS score can be improved".to_string(),
                message: "Fine-tune keyword usage and optimize formatting for better ATS compatibility"
                    .to_string(),
                auto_fixable: false,
            });
        }

        suggestions
    }

    /// One pass of placeholder sections and keyword enrichment, then a single rescore
    pub fn auto_fix(
        &self,
        sections: &ResumeSections,
        job_keywords: &BTreeSet<String>,
        keywords: &KeywordAnalysis,
        section_analysis: &SectionAnalysis,
        score_before: u8,
    ) -> AutoFixResult {
        let mut fixed = sections.clone();
        let mut fixes_applied = Vec::new();
        let missing = &keywords.missing_keywords;

        for section in &section_analysis.missing {
            match section {
                SectionType::Summary => {
                    fixed.summary = Some(SUMMARY_PLACEHOLDER.to_string());
                    fixes_applied.push("Added placeholder Summary section".to_string());
                }
                SectionType::Skills => {
                    let skills: Vec<String> = missing.iter().take(MAX_SKILL_KEYWORDS).cloned().collect();
                    fixes_applied.push(format!("Added Skills section with {} keywords", skills.len()));
                    fixed.skills = Some(skills);
                }
                SectionType::Experience => {
                    fixed.experience = Some(Vec::new());
                    fixes_applied.push("Added placeholder Experience section".to_string());
                }
                SectionType::Education => {
                    fixed.education = Some(Vec::new());
                    fixes_applied.push("Added placeholder Education section".to_string());
                }
            }
        }

        if !missing.is_empty() && missing.len() <= MAX_MISSING_FOR_ENRICHMENT {
            let summary_keywords: Vec<&str> = missing.iter().take(MAX_SUMMARY_KEYWORDS).map(String::as_str).collect();
            let summary = fixed.summary.get_or_insert_with(String::new);
            summary.push_str(&format!(" Experienced with {}.", summary_keywords.join(", ")));
            fixes_applied.push(format!("Enhanced summary with {} keywords", summary_keywords.len()));

            let skills = fixed.skills.get_or_insert_with(Vec::new);
            let existing: HashSet<String> = skills.iter().map(|s| s.to_lowercase()).collect();
            let additions: Vec<String> = missing
                .iter()
                .filter(|keyword| !existing.contains(&keyword.to_lowercase()))
                .take(MAX_SKILL_KEYWORDS)
                .cloned()
                .collect();
            if !additions.is_empty() {
                fixes_applied.push(format!("Added {} keywords to skills section", additions.len()));
                skills.extend(additions);
            }
        }

        if fixes_applied.is_empty() {
            return AutoFixResult {
                fixed_record: fixed,
                fixes_applied,
                score_before,
                score_after: score_before,
                score_improvement: 0,
            };
        }

        let score_after = self.score(&fixed, job_keywords).ats_score;
        if score_after < score_before {
            debug!(
                "Discarding auto-fix: score would drop from {} to {}",
                score_before, score_after
            );
            return AutoFixResult {
                fixed_record: sections.clone(),
                fixes_applied: Vec::new(),
                score_before,
                score_after: score_before,
                score_improvement: 0,
            };
        }

        AutoFixResult {
            fixed_record: fixed,
            fixes_applied,
            score_before,
            score_after,
            score_improvement: score_after - score_before,
        }
    }

    /// Score an aligned record and auto-fix it once when it misses the target
    pub fn optimize(&self, aligned: &AlignedRecord) -> OptimizedRecord {
        let sections = aligned.sections();
        let job_keywords = &aligned.job_keywords.all;

        let keyword_analysis = self.analyze_keywords(&sections, job_keywords);
        let section_analysis = self.analyze_sections(&sections);
        let formatting_analysis = self.analyze_formatting(&sections);
        let mut breakdown = self.breakdown(&keyword_analysis, &section_analysis, &formatting_analysis);

        let mut final_sections = sections.clone();
        if breakdown.ats_score < self.target_score {
            let fix = self.auto_fix(
                &sections,
                job_keywords,
                &keyword_analysis,
                &section_analysis,
                breakdown.ats_score,
            );
            debug!(
                "Auto-fix applied {} fixes ({} -> {})",
                fix.fixes_applied.len(),
                fix.score_before,
                fix.score_after
            );
            final_sections = fix.fixed_record.clone();
            breakdown.auto_fix = Some(fix);
        }

        let mut record = OptimizedRecord {
            profile_id: aligned.profile_id.clone(),
            job_title: aligned.job_title.clone(),
            breakdown,
            keyword_analysis,
            section_analysis,
            formatting_analysis,
            target_score: self.target_score,
            meets_target: false,
            sections: final_sections,
        };
        record.meets_target = record.final_score() >= self.target_score;
        record
    }
}

fn to_percent(value: f64) -> u8 {
    // Snap accumulated float error so exact halves round up
    let percent = (value * 100.0 * 1e9).round() / 1e9;
    percent.round().clamp(0.0, 100.0) as u8
}
