use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use dbadvisor_lib::advisory::{build_advisor_prompt, extract_advisory, AdvisoryEnvelope, DbContext};
use dbadvisor_lib::error::AdvisorError;
use dbadvisor_lib::state::{load_config, load_config_from, read_input};
use dbadvisor_lib::types::Config;

#[derive(Debug, Parser)]
#[command(
    name = "dbadvisor",
    version,
    about = "Extract structured database advice from model output"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract an advisory document from a raw model response
    Extract(ExtractArgs),
    /// Print the advisor prompt for a database context file
    Prompt(PromptArgs),
}

#[derive(Debug, Parser)]
struct ExtractArgs {
    /// Raw response file (stdin when omitted)
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,
    /// Config file (defaults to ~/.dbadvisor/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print compact JSON
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(Debug, Parser)]
struct PromptArgs {
    /// JSON database context
    #[arg(long)]
    context: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Prompt(args) => run_prompt(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("dbadvisor error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_extract(args: ExtractArgs) -> Result<ExitCode> {
    let envelope = match load_extract_inputs(&args) {
        Ok((config, text)) => {
            AdvisoryEnvelope::success(extract_advisory(&text, &config.extraction))
        }
        Err(err) => {
            log::error!("{} ({})", err, err.recovery_suggestion());
            AdvisoryEnvelope::failure(&err)
        }
    };

    let json = if args.compact {
        serde_json::to_string(&envelope)
    } else {
        serde_json::to_string_pretty(&envelope)
    }
    .context("Failed to serialize advisory envelope")?;
    println!("{json}");

    Ok(if envelope.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_extract_inputs(args: &ExtractArgs) -> Result<(Config, String), AdvisorError> {
    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let text = read_input(args.input.as_deref())?;
    Ok((config, text))
}

fn run_prompt(args: PromptArgs) -> Result<ExitCode> {
    let json = std::fs::read_to_string(&args.context)
        .with_context(|| format!("Failed to read context file {}", args.context.display()))?;
    let context = DbContext::from_json(&json)?;
    print!("{}", build_advisor_prompt(&context));
    Ok(ExitCode::SUCCESS)
}
