use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikibridge_core::catalog::tool_catalog;
use wikibridge_core::config::{BridgeConfig, load_file_config};
use wikibridge_core::gateway::GraphQlClient;
use wikibridge_core::server::Server;
use wikibridge_core::tools::dispatch;

const DEFAULT_CONFIG_FILE: &str = "wikibridge.toml";
const DEFAULT_LOG_FILTER: &str = "wikibridge=info,wikibridge_core=info";

#[derive(Debug, Parser)]
#[command(
    name = "wikibridge",
    version,
    about = "Wiki.js page management exposed as MCP tools over stdio"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "TOML config file (default ./wikibridge.toml)"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Load environment from this file instead of ./.env"
    )]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the MCP tool server on stdin/stdout")]
    Serve,
    #[command(about = "Print tool descriptors as JSON")]
    Tools,
    #[command(about = "Run a single tool call and print its response")]
    Call(CallArgs),
    #[command(about = "Print the resolved configuration (token redacted)")]
    Config,
}

#[derive(Debug, Args)]
struct CallArgs {
    #[arg(value_name = "TOOL")]
    tool: String,
    #[arg(
        long,
        value_name = "JSON",
        default_value = "{}",
        help = "Tool arguments as a JSON object"
    )]
    args: String,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();
    load_env(cli.env_file.as_deref())?;

    match cli.command {
        Some(Commands::Serve) => run_serve(cli.config.as_deref()),
        Some(Commands::Tools) => run_tools(),
        Some(Commands::Call(args)) => run_call(cli.config.as_deref(), args),
        Some(Commands::Config) => run_config(cli.config.as_deref()),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_env(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenvy::from_path_override(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

fn resolve_config(config_path: Option<&Path>) -> Result<BridgeConfig> {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let file = load_file_config(path)?;
    BridgeConfig::from_env(&file)
}

fn run_serve(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = resolve_config(config_path)?;
    tracing::info!(
        api_url = %config.gateway.api_url,
        timeout_ms = config.gateway.timeout_ms,
        "starting wikibridge"
    );
    let client = GraphQlClient::new(config.gateway)?;
    let mut server = Server::new(client, config.tools);

    let stdin = io::stdin();
    let stdout = io::stdout();
    server.run(stdin.lock(), stdout.lock())?;
    Ok(ExitCode::SUCCESS)
}

fn run_tools() -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(&tool_catalog())?);
    Ok(ExitCode::SUCCESS)
}

fn run_call(config_path: Option<&Path>, args: CallArgs) -> Result<ExitCode> {
    let arguments: Value =
        serde_json::from_str(&args.args).context("--args must be valid JSON")?;
    let config = resolve_config(config_path)?;
    let mut client = GraphQlClient::new(config.gateway)?;

    let envelope = dispatch(&mut client, &config.tools, &args.tool, &arguments);
    println!("{}", envelope.render());
    Ok(if envelope.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_config(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = resolve_config(config_path)?;
    println!("{}", config.diagnostics());
    Ok(ExitCode::SUCCESS)
}
