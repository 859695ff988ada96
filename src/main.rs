use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use heatstack::config::{load_settings, Settings};
use heatstack::orchestrator::{deploy_template_file, ensure_complete, AttachSpec, DeploymentOptions};

/// Resolve a Heat template into an emulated OpenStack stack
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the Heat template YAML file
    #[arg(short, long)]
    template: PathBuf,

    /// Output path for the stack snapshot JSON
    #[arg(short, long, default_value = "stack.json")]
    output: PathBuf,

    /// Optional settings YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of the created stack
    #[arg(long, default_value = "stack")]
    stack_name: String,

    /// Bind a port after resolution, as PORT=NETWORK[@IP]
    #[arg(long = "attach", value_name = "PORT=NETWORK[@IP]")]
    attachments: Vec<AttachSpec>,

    /// Fail if any declaration stays unresolved
    #[arg(long)]
    strict: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };

    let log_level = args
        .log_level
        .clone()
        .or_else(|| settings.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("Template file: {:?}", args.template);
    info!("Output file: {:?}", args.output);

    let mut options = DeploymentOptions::from_settings(&args.stack_name, &settings);
    options.attachments = args.attachments;

    let deployment = deploy_template_file(&args.template, &options, &args.output)?;
    if args.strict {
        ensure_complete(&deployment.report)?;
    }

    info!("Stack {} deployed", deployment.snapshot.stack_name);
    Ok(())
}
