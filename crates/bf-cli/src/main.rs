// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use bf_core::{Project, ProjectStatus};
use bf_orchestrator::{
    CancellationToken, Collaborators, EventBus, GenerationContext, MockArchiveAssembler,
    MockProjectStorage, MockTemplating,
};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Exit code for a pipeline failure.
const EXIT_PIPELINE_FAILURE: i32 = 1;
/// Exit code for a configuration error.
const EXIT_CONFIG_ERROR: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "backforge", version, about = "Backforge generation orchestrator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load configuration from the environment and print the effective settings.
    Config,

    /// Run a one-shot generation pipeline against mock collaborators.
    Run {
        /// The natural-language prompt describing the backend to build.
        #[arg(long)]
        prompt: String,

        /// Project slug to use in the canned smoke-test spec.
        #[arg(long, default_value = "smoke-test-api")]
        project_name: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("backforge=debug")
    } else {
        EnvFilter::new("backforge=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let exit_code = match cli.command {
        Commands::Config => cmd_config(),
        Commands::Run { prompt, project_name } => cmd_run(prompt, project_name).await,
    };

    std::process::exit(exit_code);
}

fn cmd_config() -> i32 {
    match bf_config::BackforgeConfig::from_env() {
        Ok(config) => {
            println!("database_url:          {}", redact(&config.database_url));
            println!("llm_api_key:           {}", redact(&config.llm_api_key));
            println!("cors_origins:          {:?}", config.cors_origins);
            println!("token_expiry_minutes:  {}", config.token_expiry_minutes);
            println!("max_repair_attempts:   {}", config.max_repair_attempts);
            println!(
                "sandbox_port_range:    {}-{}",
                config.sandbox_port_range.0, config.sandbox_port_range.1
            );
            for warning in config.warnings() {
                eprintln!("warning: {} ({})", warning.message, warning.field);
            }
            0
        }
        Err(err) => {
            eprintln!("configuration error: {err}");
            EXIT_CONFIG_ERROR
        }
    }
}

fn redact(value: &str) -> String {
    if value.is_empty() {
        "<empty>".to_string()
    } else {
        "<set>".to_string()
    }
}

async fn cmd_run(prompt: String, project_name: String) -> i32 {
    match run_pipeline(prompt, project_name).await {
        Ok(project) => {
            println!("status: {:?}", project.status);
            println!("model_used: {:?}", project.model_used);
            println!("zip_path: {:?}", project.zip_path);
            if project.status == ProjectStatus::AwaitingVerification {
                0
            } else {
                EXIT_PIPELINE_FAILURE
            }
        }
        Err(err) => {
            eprintln!("pipeline failed: {err:#}");
            EXIT_PIPELINE_FAILURE
        }
    }
}

async fn run_pipeline(prompt: String, project_name: String) -> Result<Project> {
    let provider = bf_llm::MockLlmProvider::new();
    provider.push(bf_llm::DEFAULT_MODEL, Ok(smoke_test_spec_json(&project_name)));

    let mut files = HashMap::new();
    files.insert("app/main.py".to_string(), "# smoke-test stub\n".to_string());
    let templating = MockTemplating::new(files);
    let archiver = MockArchiveAssembler;
    let storage = MockProjectStorage;

    let collaborators = Collaborators {
        llm: &provider,
        templating: &templating,
        archiver: &archiver,
        storage: &storage,
    };

    let mut project = Project::new(Uuid::new_v4(), &project_name, &prompt);
    let cancel = CancellationToken::new();
    let bus = EventBus::new();

    bf_orchestrator::run_generation(
        &mut project,
        &GenerationContext::default(),
        &collaborators,
        &cancel,
        &bus,
    )
    .await
    .context("pipeline run")?;

    Ok(project)
}

fn smoke_test_spec_json(project_name: &str) -> String {
    format!(
        r#"{{
            "project_name": "{project_name}",
            "description": "A smoke-test backend generated without a real LLM provider",
            "database": {{"kind": "postgres", "version": "15"}},
            "auth": {{"enabled": false, "kind": "none", "token_expiry_minutes": 60}},
            "entities": [{{
                "name": "Task",
                "table_name": "tasks",
                "fields": [
                    {{"name": "id", "type": "uuid", "primary_key": true, "nullable": false, "unique": true}},
                    {{"name": "title", "type": "string", "primary_key": false, "nullable": false, "unique": false}}
                ],
                "crud": true
            }}],
            "spec_version": "1"
        }}"#
    )
}
