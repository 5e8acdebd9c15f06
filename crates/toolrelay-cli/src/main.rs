//! toolrelay: chat with an LLM that can call tools on your MCP servers

mod repl;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use toolrelay_core::{
    create_provider, default_chain, log_info, log_warn, Agent, ConfigProvider,
    ConsoleLogger, FileConfigProvider, FileLogger, LogLevel, Logger, Provider, ProviderSettings,
    SessionManager, SettingsOverrides, ToolRegistry,
};

use crate::repl::ChatLoop;

#[derive(Parser, Debug)]
#[command(name = "toolrelay")]
#[command(version)]
#[command(about = "Chat with an LLM that can call tools on your MCP servers")]
#[command(
    long_about = "toolrelay connects to every MCP server listed in the config file, \
merges their tools into one catalog and starts an interactive chat. The model may \
call tools over several rounds before it answers.\n\n\
Config lookup (when --config is not given):\n\
  ./server_config.json, then <config_dir>/toolrelay/servers.yaml\n\n\
Environment Variables:\n\
  ANTHROPIC_API_KEY   Key for the anthropic provider\n\
  GROQ_API_KEY        Key for the groq provider (default)\n\
  OPENAI_API_KEY      Key for the openai provider\n\
  TOOLRELAY_PROVIDER  Provider id when --provider is not given\n\
  TOOLRELAY_LOG       Log level (debug, info, warn, error)\n\n\
Type 'quit' or press Ctrl+C to exit."
)]
struct Args {
    /// Server config file (JSON or YAML)
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// LLM provider: anthropic, groq, openai or mock
    #[arg(short = 'p', long, env = "TOOLRELAY_PROVIDER", value_name = "PROVIDER")]
    provider: Option<String>,

    /// Model name, overriding the config and provider default
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Maximum tokens per model turn
    #[arg(long, value_name = "N")]
    max_tokens: Option<u32>,

    /// Sampling temperature (provider default when omitted)
    #[arg(long, value_name = "T")]
    temperature: Option<f32>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Run a single query and exit
    #[arg(short = 'q', long, value_name = "TEXT")]
    query: Option<String>,
}

impl Args {
    fn log_level(&self) -> LogLevel {
        if self.verbose > 0 {
            return LogLevel::from_verbosity(self.verbose);
        }
        std::env::var("TOOLRELAY_LOG")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            provider: self.provider.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

fn build_logger(args: &Args) -> Result<Arc<dyn Logger>, Box<dyn Error>> {
    let level = args.log_level();
    let logger: Arc<dyn Logger> = match &args.log_file {
        Some(path) => Arc::new(FileLogger::open(path, level)?),
        None => Arc::new(ConsoleLogger::new().with_level(level)),
    };
    Ok(logger)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let code = match run(args).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("❌ {}", e);
            1
        }
    };
    // A pending stdin read would otherwise keep the runtime alive
    std::process::exit(code);
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let logger = build_logger(&args)?;

    // Everything fallible happens before any server is launched
    let config_provider = match &args.config {
        Some(path) => FileConfigProvider::new(path),
        None => FileConfigProvider::discover("."),
    };
    log_info!(logger, "[main] Loading config from {}", config_provider.describe());
    let config = config_provider.load().await?;

    let secrets = default_chain(None)?;
    let settings = ProviderSettings::resolve(&args.overrides(), &config.defaults())?
        .with_api_key_from(&secrets)?;
    let provider = create_provider(&settings, Arc::clone(&logger))?;
    log_info!(
        logger,
        "[main] Using provider {} with model {}",
        provider.name(),
        provider.model()
    );

    let sessions = SessionManager::mcp(Arc::clone(&logger));
    let mut registry = ToolRegistry::new(Arc::clone(&logger));
    let report = sessions.connect_all(&config.mcp_servers, &mut registry).await;
    for (name, tools) in &report.connected {
        println!("\nConnected to {} with tools: {:?}", name, tools);
    }
    for failure in &report.failed {
        println!("{}", failure);
    }
    if report.connected.is_empty() && !config.mcp_servers.is_empty() {
        log_warn!(logger, "[main] No tool servers available; chatting without tools");
    }

    let agent = Agent::new(provider, Arc::new(registry), Arc::clone(&logger));
    let outcome = converse(&agent, args.query.as_deref()).await;

    let teardown = sessions.teardown().await;
    log_info!(logger, "[main] Closed {} tool servers", teardown.closed.len());

    outcome
}

/// One-shot query or the interactive loop, ended early by Ctrl-C
async fn converse(agent: &Agent, query: Option<&str>) -> Result<(), Box<dyn Error>> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut chat = ChatLoop::new(agent, stdin, std::io::stdout());

    tokio::select! {
        result = async {
            match query {
                Some(q) => chat.ask(q).await.map(|_| ()),
                None => chat.run().await.map(|_| ()),
            }
        } => result?,
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_every_flag_has_help() {
        let cmd = Args::command();
        cmd.clone().debug_assert();
        for arg in cmd.get_arguments() {
            assert!(arg.get_help().is_some(), "--{} has no help text", arg.get_id());
        }
    }

    #[test]
    fn test_overrides_from_flags() {
        let args = Args::parse_from(["toolrelay", "-p", "anthropic", "--temperature", "0.2", "-vv"]);
        let overrides = args.overrides();
        assert_eq!(overrides.provider.as_deref(), Some("anthropic"));
        assert_eq!(overrides.temperature, Some(0.2));
        assert_eq!(args.log_level(), LogLevel::Debug);
    }
}
