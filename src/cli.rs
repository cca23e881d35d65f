//! CLI interface for the resume optimizer

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-optimizer")]
#[command(about = "Tailor an applicant profile to a job posting and score its ATS compatibility")]
#[command(long_about = "Runs a five-stage pipeline (extract job, retrieve profile, align content, optimize for ATS, render) with checkpointed run state")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full optimization pipeline
    Run {
        /// Job posting location: file:// URL or path to a .json, .txt or .md posting
        #[arg(short, long)]
        job: String,

        /// Applicant profile id (loads <profiles_dir>/<id>.json)
        #[arg(short, long)]
        profile: String,

        /// Run id to use instead of a generated one
        #[arg(long)]
        run_id: Option<String>,

        /// Renderer template: markdown or json
        #[arg(short, long)]
        template: Option<String>,

        /// Output format: console or json
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Score a saved aligned record without running the pipeline
    Score {
        /// Path to an aligned record JSON file
        #[arg(short, long)]
        aligned: PathBuf,

        /// Output format: console or json
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Inspect stored run contexts
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ContextAction {
    /// Print a stored run context as JSON
    Show {
        /// Run id
        run_id: String,
    },

    /// List stored run ids
    List,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Invalid output format: {}. Supported: console, json", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
