//! quill - a coding agent harness for your terminal

use clap::Parser;
use tracing::error;

mod commands;

use commands::{build_engine, run_interactive, run_single};

/// quill - a coding agent for your terminal
#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "A coding agent harness with tool use, permissions, and subagents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Working directory (default: current)
    #[arg(short = 'd', long)]
    directory: Option<String>,

    /// Single prompt (non-interactive)
    #[arg(short, long)]
    prompt: Option<String>,

    /// Model to use (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Agent profile to start with (build, plan)
    #[arg(long)]
    agent: Option<String>,

    /// Path to an MCP server config JSON file
    #[arg(long)]
    mcp_config: Option<String>,

    /// Require confirmation before running gated tools
    #[arg(long)]
    no_auto_approve: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }

    let options = commands::Options {
        directory: cli.directory,
        model: cli.model,
        agent: cli.agent,
        mcp_config: cli.mcp_config,
        auto_approve: !cli.no_auto_approve,
    };

    let mut engine = match build_engine(options).await {
        Ok(engine) => engine,
        Err(e) => {
            error!("startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.prompt {
        Some(prompt) => run_single(&mut engine, &prompt).await,
        None => run_interactive(&mut engine).await,
    };

    engine.shutdown().await;

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
