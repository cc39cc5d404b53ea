use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use scriptcheck_core::llm::providers::create_llm_client;
use scriptcheck_core::{ConfigLoader, DockerScriptExecutor, ScriptValidator};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(
    name = "scriptcheck",
    author,
    version = "0.1.0",
    about = "Analyze a script with an LLM, then verify one predicted test in Docker"
)]
struct Cli {
    /// Script to validate
    script: String,

    /// README describing how the script is used
    readme: String,

    #[clap(long, short, help = "YAML configuration file")]
    config: Option<PathBuf>,

    #[clap(long, help = "Directory for the generated Dockerfile, README and script copy")]
    output_dir: Option<PathBuf>,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = match ConfigLoader::load(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let validator = match build_validator(&config) {
        Ok(validator) => validator,
        Err(e) => {
            log::error!("{:#}", e);
            process::exit(1);
        }
    };

    log::info!("Starting script validation for {}", cli.script);
    match validator.execute(&[cli.script, cli.readme]).await {
        Ok(report) => {
            println!("{}", report.render());
            log::info!("Script validation completed");
            Ok(())
        }
        // Already logged by the validator
        Err(failure) => process::exit(failure.exit_code()),
    }
}

fn build_validator(config: &scriptcheck_core::ScriptCheckConfig) -> Result<ScriptValidator> {
    let llm = create_llm_client(&config.llm)?;
    let executor = DockerScriptExecutor::new(
        config.execution.build_timeout_secs,
        config.execution.run_timeout_secs,
    )?;
    let validator = ScriptValidator::from_config(config, llm, Arc::new(executor))?;
    Ok(validator)
}
