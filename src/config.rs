//! Configuration management for the resume optimizer

use crate::error::{Result, ResumeOptimizerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub workflow: WorkflowConfig,
    pub alignment: AlignmentConfig,
    pub ats: AtsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Directory holding one JSON snapshot per run id
    pub context_dir: PathBuf,
    /// Directory rendered resumes are written to
    pub output_dir: PathBuf,
    /// Directory of `<profile_id>.json` applicant profiles
    pub profiles_dir: PathBuf,
    /// Renderer template identifier ("markdown" or "json")
    pub template: String,
    /// Profile relevance below this adds a run warning
    pub min_profile_relevance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentConfig {
    pub skills_weight: f32,
    pub experience_weight: f32,
    pub min_keyword_length: usize,
    pub max_ranked_experience: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsConfig {
    pub keyword_weight: f64,
    pub section_weight: f64,
    pub formatting_weight: f64,
    pub target_score: u8,
    pub min_keyword_density: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            skills_weight: 1.2,
            experience_weight: 1.5,
            min_keyword_length: 3,
            max_ranked_experience: 5,
        }
    }
}

impl Default for AtsConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 0.35,
            section_weight: 0.40,
            formatting_weight: 0.25,
            target_score: 90,
            min_keyword_density: 0.7,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-optimizer");

        Self {
            workflow: WorkflowConfig {
                context_dir: data_dir.join("workflow_context"),
                output_dir: data_dir.join("output"),
                profiles_dir: data_dir.join("profiles"),
                template: "markdown".to_string(),
                min_profile_relevance: 0.1,
            },
            alignment: AlignmentConfig::default(),
            ats: AtsConfig::default(),
            output: OutputConfig {
                format: OutputFormat::Console,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load the configuration at `config_path`, writing defaults on first use
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeOptimizerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-optimizer")
            .join("config.toml")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.workflow.context_dir)?;
        std::fs::create_dir_all(&self.workflow.output_dir)?;
        std::fs::create_dir_all(&self.workflow.profiles_dir)?;
        Ok(())
    }
}
