//! Console and JSON presentation of run results and ATS reports

use crate::config::OutputFormat;
use crate::error::Result;
use crate::processing::records::{OptimizedRecord, ScoreCategory, SuggestionPriority};
use crate::workflow::orchestrator::RunResult;
use colored::{Color, Colorize};

pub trait OutputFormatter {
    fn format_run(&self, result: &RunResult) -> Result<String>;
    fn format_optimized(&self, record: &OptimizedRecord) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

/// Formatter matching the configured output format
pub fn formatter_for(format: OutputFormat, use_colors: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(use_colors)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let category = ScoreCategory::from_score(score);
        let color = match category {
            ScoreCategory::Excellent => Color::Green,
            ScoreCategory::Good => Color::BrightGreen,
            ScoreCategory::Fair => Color::Yellow,
            ScoreCategory::Poor => Color::BrightRed,
        };
        let badge = category.to_string().to_uppercase();

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_priority(&self, priority: SuggestionPriority) -> String {
        match priority {
            SuggestionPriority::High => self.colorize("[*]", Color::Yellow),
            SuggestionPriority::Medium => self.colorize("[-]", Color::Blue),
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_run(&self, result: &RunResult) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME OPTIMIZATION RUN", 1));
        output.push_str(&format!("Run id: {}\n", result.run_id));

        let status = if result.success {
            self.colorize("SUCCESS", Color::Green)
        } else {
            self.colorize("FAILED", Color::Red)
        };
        output.push_str(&format!("Status: {}\n", status));

        if let Some(score) = result.ats_score {
            output.push_str(&format!("ATS score: {} {}\n", score, self.format_score_badge(score)));
        }
        if let Some(path) = &result.artifact_path {
            output.push_str(&format!("Artifact: {}\n", path.display()));
        }

        output.push_str(&self.format_header("Stages", 2));
        for (stage, seconds) in &result.execution_time {
            let marker = if stage == "total" || result.completed_stages.contains(stage) {
                self.colorize("ok", Color::Green)
            } else {
                self.colorize("failed", Color::Red)
            };
            output.push_str(&format!("  {:<18} {:>8.3}s  {}\n", stage, seconds, marker));
        }

        if !result.errors.is_empty() {
            output.push_str(&self.format_header("Errors", 3));
            for err in &result.errors {
                output.push_str(&format!("  • {}\n", self.colorize(err, Color::Red)));
            }
        }

        if !result.warnings.is_empty() {
            output.push_str(&self.format_header("Warnings", 3));
            for warning in &result.warnings {
                output.push_str(&format!("  • {}\n", self.colorize(warning, Color::Yellow)));
            }
        }

        Ok(output)
    }

    fn format_optimized(&self, record: &OptimizedRecord) -> Result<String> {
        let mut output = String::new();
        let breakdown = &record.breakdown;

        output.push_str(&self.format_header("ATS COMPATIBILITY REPORT", 1));
        if !record.job_title.is_empty() {
            output.push_str(&format!("Position: {}\n", record.job_title));
        }
        output.push_str(&format!(
            "ATS score: {} {} ({})\n",
            breakdown.ats_score,
            self.format_score_badge(breakdown.ats_score),
            breakdown.category.status()
        ));

        output.push_str(&self.format_header("Score Breakdown", 2));
        output.push_str(&format!("  Keywords:   {}%\n", breakdown.keyword_score));
        output.push_str(&format!("  Sections:   {}%\n", breakdown.section_score));
        output.push_str(&format!("  Formatting: {}%\n", breakdown.formatting_score));

        if !record.keyword_analysis.missing_keywords.is_empty() {
            let missing: Vec<&str> = record
                .keyword_analysis
                .missing_keywords
                .iter()
                .take(10)
                .map(String::as_str)
                .collect();
            output.push_str(&format!("  Missing keywords: {}\n", self.colorize(&missing.join(", "), Color::Yellow)));
        }

        if !breakdown.suggestions.is_empty() {
            output.push_str(&self.format_header("Suggestions", 2));
            for suggestion in &breakdown.suggestions {
                output.push_str(&format!(
                    "  {} {} - {}\n",
                    self.format_priority(suggestion.priority),
                    suggestion.issue,
                    suggestion.message
                ));
            }
        }

        if let Some(fix) = &breakdown.auto_fix {
            output.push_str(&self.format_header("Auto-fix", 3));
            for applied in &fix.fixes_applied {
                output.push_str(&format!("  • {}\n", applied));
            }
            output.push_str(&format!(
                "  Score: {} -> {} (+{})\n",
                fix.score_before, fix.score_after, fix.score_improvement
            ));
        }

        let target = if record.meets_target {
            self.colorize("met", Color::Green)
        } else {
            self.colorize("not met", Color::Red)
        };
        output.push_str(&format!("\nTarget {}: {}\n", record.target_score, target));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_run(&self, result: &RunResult) -> Result<String> {
        self.to_json(result)
    }

    fn format_optimized(&self, record: &OptimizedRecord) -> Result<String> {
        self.to_json(record)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}
