//! Engine wiring and the interactive loop.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;

use quill_agent::tools::{register_default_tools, register_remote_tools, ToolRegistry};
use quill_agent::{AgentError, ApprovalGate, ProfileRegistry, Turn, TurnEngine};
use quill_config::Config;
use quill_mcp::McpManager;
use quill_provider::OpenAiProvider;

/// Cut at a char boundary at or below `max` bytes.
fn clip(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const RED: &str = "\x1b[91m";
const CYAN: &str = "\x1b[96m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Startup options assembled from CLI flags.
pub struct Options {
    pub directory: Option<String>,
    pub model: Option<String>,
    pub agent: Option<String>,
    pub mcp_config: Option<String>,
    pub auto_approve: bool,
}

/// Approval gate that asks on stdin.
struct StdinGate;

#[async_trait]
impl ApprovalGate for StdinGate {
    async fn approve(&self, tool_name: &str, _call_id: &str, arguments: &Value) -> bool {
        let prompt = format!(
            "\n{}Tool request: {}{}\n{}{}{}\nApprove? [y/N] ",
            YELLOW,
            tool_name,
            RESET,
            DIM,
            serde_json::to_string_pretty(arguments).unwrap_or_default(),
            RESET
        );
        // Blocking stdin read off the async runtime
        tokio::task::spawn_blocking(move || {
            print!("{}", prompt);
            let _ = std::io::stdout().flush();
            let mut input = String::new();
            if std::io::stdin().read_line(&mut input).is_err() {
                return false;
            }
            matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

/// Build a fully wired engine from config plus CLI overrides.
pub async fn build_engine(options: Options) -> Result<TurnEngine> {
    let mut config = Config::load().await?;
    if let Some(dir) = options.directory {
        config.workspace = Some(dir);
    }
    if let Some(path) = options.mcp_config {
        config.tools.mcp_config = Some(path);
    }

    let workspace = config.workspace_path();
    anyhow::ensure!(
        workspace.is_dir(),
        "{} is not a valid directory",
        workspace.display()
    );

    let api_key = config
        .api_key()
        .context("no API key configured; set provider.api_key in ~/.quill/config.json or OPENAI_API_KEY")?;
    let model = options.model.unwrap_or_else(|| config.default_model());
    let provider = Arc::new(OpenAiProvider::new(
        api_key,
        config.api_base(),
        Some(model.clone()),
    ));

    let profiles = Arc::new(ProfileRegistry::builtin());

    let mut registry = ToolRegistry::new();
    register_default_tools(&mut registry, &config, &workspace);

    let mcp = match config.mcp_config_path() {
        Some(path) => {
            let manager = Arc::new(McpManager::from_config_file(&path).await?);
            register_remote_tools(&mut registry, &manager).await;
            Some(manager)
        }
        None => None,
    };

    let profile = options.agent.unwrap_or_else(|| config.agent.profile.clone());
    let mut engine = TurnEngine::new(
        provider,
        Arc::new(registry),
        profiles,
        &profile,
        model,
    )?
    .with_auto_approve(options.auto_approve);

    if !options.auto_approve {
        engine = engine.with_approval_gate(Arc::new(StdinGate));
    }
    if let Some(mcp) = mcp {
        engine = engine.with_mcp(mcp);
    }

    Ok(engine)
}

fn print_tool_call(turn: &Turn, index: usize) {
    let call = &turn.tool_calls[index];
    println!(
        "\n{}[{}] tool: {}{}",
        CYAN, turn.agent_name, call.name, RESET
    );
    if let Some(obj) = call.arguments.as_object() {
        for (key, value) in obj {
            let text = value.to_string();
            if text.len() > 100 {
                println!("{}  {}: {}...{}", DIM, key, clip(&text, 100), RESET);
            } else {
                println!("{}  {}: {}{}", DIM, key, text, RESET);
            }
        }
    }
}

fn print_tool_result(turn: &Turn, index: usize) {
    let result = &turn.tool_results[index];
    let name = &turn.tool_calls[index].name;
    if result.success {
        println!("{}[{} completed]{}", GREEN, name, RESET);
        if let Some(output) = &result.output {
            if output.len() > 500 {
                let kept = clip(output, 500);
                println!("{}\n... ({} more bytes)", kept, output.len() - kept.len());
            } else {
                println!("{}", output);
            }
        }
    } else {
        println!(
            "{}[{} failed: {}]{}",
            RED,
            name,
            result.error.as_deref().unwrap_or("unknown"),
            RESET
        );
    }
}

fn render_turn(turn: &Turn) {
    for i in 0..turn.tool_calls.len() {
        print_tool_call(turn, i);
        print_tool_result(turn, i);
    }
    if turn.finished {
        if let Some(text) = &turn.response {
            println!("\n{}{}{}", GREEN, text, RESET);
        }
    }
}

/// Drive one submission, rendering turns as they arrive. Ctrl-C cancels
/// the in-flight turn and abandons the run.
async fn run_submission(engine: &mut TurnEngine, input: &str) -> Result<()> {
    engine.reset_cancellation();
    let token = engine.cancellation_token();
    let mut run = engine.submit(input);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                token.cancel();
            }
            turn = run.next_turn() => {
                match turn {
                    Ok(Some(turn)) => {
                        render_turn(&turn);
                        if turn.finished {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(AgentError::Cancelled) => {
                        println!("\n{}Cancelled.{}", YELLOW, RESET);
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    Ok(())
}

/// Single prompt, then exit.
pub async fn run_single(engine: &mut TurnEngine, prompt: &str) -> Result<()> {
    run_submission(engine, prompt).await
}

/// Interactive REPL.
pub async fn run_interactive(engine: &mut TurnEngine) -> Result<()> {
    println!("{}quill - interactive mode{}", BOLD, RESET);
    println!(
        "{}agent: {} | {}{}",
        DIM,
        engine.profile().name,
        engine.context_summary(),
        RESET
    );
    println!(
        "{}commands: exit, reset, history, status, agents, switch <agent>{}\n",
        DIM, RESET
    );

    loop {
        print!("{}{} > {}", CYAN, engine.profile().name, RESET);
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break; // EOF
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "exit" | "quit" => break,
            "reset" => {
                engine.reset();
                println!("{}Session reset.{}", YELLOW, RESET);
            }
            "status" => println!("{}{}{}", DIM, engine.context_summary(), RESET),
            "history" => {
                for msg in engine.session().messages() {
                    println!("{}[{}]{}", CYAN, msg.role, RESET);
                    if let Some(content) = &msg.content {
                        if content.len() > 200 {
                            println!("{}...", clip(content, 200));
                        } else {
                            println!("{}", content);
                        }
                    }
                }
            }
            "agents" => {
                let current = engine.profile().name.clone();
                for profile in engine.profiles().primary() {
                    let marker = if profile.name == current { " *" } else { "" };
                    println!(
                        "{}  {}: {}{}{}",
                        DIM, profile.name, profile.description, marker, RESET
                    );
                }
            }
            _ if input.starts_with("switch ") => {
                let name = input["switch ".len()..].trim();
                match engine.switch_profile(name) {
                    Ok(()) => println!("{}Switched to {} agent.{}", YELLOW, name, RESET),
                    Err(e) => println!("{}{}{}", RED, e, RESET),
                }
            }
            _ => {
                if let Err(e) = run_submission(engine, input).await {
                    println!("{}Error: {}{}", RED, e, RESET);
                }
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
