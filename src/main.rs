//! Resume optimizer: tailor applicant profiles to job postings and score ATS compatibility

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_optimizer::cli::{self, Cli, Commands, ConfigAction, ContextAction};
use resume_optimizer::config::{Config, OutputFormat};
use resume_optimizer::input::{FileJobExtractor, FileProfileRetriever};
use resume_optimizer::output::{formatter_for, FileDocumentRenderer};
use resume_optimizer::processing::records::AlignedRecord;
use resume_optimizer::processing::ATSScoringEngine;
use resume_optimizer::workflow::{ContextStore, Orchestrator, PipelineEvent, PipelineObserver, Stage};
use resume_optimizer::ResumeOptimizerError;
use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    match run_command(cli.command, config, &config_path).await {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            error!("Command failed: {:#}", e);
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but the pipeline did not succeed
async fn run_command(command: Commands, config: Config, config_path: &Path) -> anyhow::Result<bool> {
    match command {
        Commands::Run {
            job,
            profile,
            run_id,
            template,
            output,
        } => {
            let format = resolve_format(output.as_deref(), &config)?;
            config.ensure_dirs().context("Failed to create data directories")?;

            let mut orchestrator = Orchestrator::from_config(
                &config,
                FileJobExtractor::new()?,
                FileProfileRetriever::new(&config.workflow.profiles_dir)?,
                FileDocumentRenderer::new(&config.workflow.output_dir),
            )?;
            if let Some(template) = &template {
                orchestrator = orchestrator.with_template(template);
            }
            if format == OutputFormat::Console {
                orchestrator = orchestrator.with_observer(Box::new(ProgressObserver::new()));
            }

            info!("Starting resume optimization for profile '{}'", profile);
            let result = match &run_id {
                Some(id) => orchestrator.run_with_id(id, &job, &profile).await,
                None => orchestrator.run(&job, &profile).await,
            };

            let formatter = formatter_for(format, config.output.color_output);
            println!("{}", formatter.format_run(&result)?);
            Ok(result.success)
        }

        Commands::Score { aligned, output } => {
            cli::validate_file_extension(&aligned, &["json"])
                .map_err(|e| ResumeOptimizerError::InvalidInput(format!("Aligned record: {}", e)))?;
            let format = resolve_format(output.as_deref(), &config)?;

            let content = tokio::fs::read_to_string(&aligned)
                .await
                .with_context(|| format!("Failed to read {}", aligned.display()))?;
            let record: AlignedRecord = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse aligned record {}", aligned.display()))?;

            let engine = ATSScoringEngine::from_config(&config.ats)?;
            let optimized = engine.optimize(&record);

            let formatter = formatter_for(format, config.output.color_output);
            println!("{}", formatter.format_optimized(&optimized)?);
            Ok(optimized.meets_target)
        }

        Commands::Context { action } => {
            let store = ContextStore::new(&config.workflow.context_dir);
            match action {
                ContextAction::Show { run_id } => {
                    let context = store.load(&run_id).await?;
                    println!("{}", serde_json::to_string_pretty(&context)?);
                }
                ContextAction::List => {
                    let ids = store.list().await?;
                    if ids.is_empty() {
                        println!("No stored runs in {}", store.base_dir().display());
                    }
                    for id in ids {
                        println!("{}", id);
                    }
                }
            }
            Ok(true)
        }

        Commands::Config { action } => {
            match action {
                Some(ConfigAction::Show) | None => {
                    println!("Current Configuration ({})\n", config_path.display());
                    println!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
                }

                Some(ConfigAction::Reset) => {
                    Config::default().save_to(config_path)?;
                    println!("Configuration reset to defaults: {}", config_path.display());
                }

                Some(ConfigAction::Path) => {
                    println!("{}", config_path.display());
                }
            }
            Ok(true)
        }
    }
}

fn resolve_format(requested: Option<&str>, config: &Config) -> anyhow::Result<OutputFormat> {
    match requested {
        Some(format) => Ok(cli::parse_output_format(format).map_err(ResumeOptimizerError::InvalidInput)?),
        None => Ok(config.output.format),
    }
}

/// Stage-by-stage progress bar for console runs
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(Stage::ALL.len() as u64);
        let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }
}

impl PipelineObserver for ProgressObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage, .. } => self.bar.set_message(stage.name()),
            PipelineEvent::StageCompleted { .. } => self.bar.inc(1),
            PipelineEvent::StageFailed { stage, .. } => {
                self.bar.abandon_with_message(format!("{} failed", stage));
            }
            PipelineEvent::RunFinished { success, .. } => {
                if *success {
                    self.bar.finish_with_message("done");
                } else if !self.bar.is_finished() {
                    self.bar.abandon();
                }
            }
        }
    }
}
