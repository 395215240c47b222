use anyhow::{Context, Result};
use clap::Parser;
use sonarqube_mcp::transport::{serve_stdio, StdioOptions};
use sonarqube_mcp::{Dispatcher, McpServer, Session, ToolRegistry};
use sonarqube_sdk::{SonarClient, SonarConfig};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod api;
mod check;
mod config;
mod websocket;

use config::{AppState, ServerConfig, Transport};

#[derive(Parser, Debug)]
#[command(name = "sonarqube-mcp", version)]
#[command(about = "Model Context Protocol server for the SonarQube Web API", long_about = None)]
struct Args {
    /// Transport binding to serve
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: Transport,

    /// Host to bind to (sse and streamable-http)
    #[arg(long, env = "SONARQUBE_MCP_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (sse and streamable-http)
    #[arg(short, long, env = "SONARQUBE_MCP_PORT", default_value = "8000")]
    port: u16,

    /// Resolve configuration, probe the server, print a JSON report and exit
    #[arg(long)]
    check_config: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "SONARQUBE_MCP_LOG_JSON")]
    log_json: bool,

    /// Requests the stdio binding keeps in flight; replies stay in order
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
    stdio_concurrency: u16,

    /// Seconds a streamable HTTP session may stay unused before it is closed
    #[arg(
        long,
        env = "SONARQUBE_MCP_SESSION_IDLE_SECS",
        default_value = "1800",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    session_idle_secs: u64,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            transport: self.transport,
            host: self.host.clone(),
            port: self.port,
            stdio_concurrency: usize::from(self.stdio_concurrency),
            session_idle: Duration::from_secs(self.session_idle_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let sonar = SonarConfig::from_env().context("Invalid SonarQube configuration")?;
    tracing::info!(
        base_url = %sonar.display_url(),
        auth_mode = sonar.auth.name(),
        organization = sonar.organization.as_deref().unwrap_or("-"),
        "Resolved SonarQube configuration"
    );
    let client = SonarClient::from_config(sonar).context("Failed to create SonarQube client")?;

    if args.check_config {
        let reachable = check::run(&client, &mut std::io::stdout().lock()).await?;
        return Ok(if reachable {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let registry = ToolRegistry::with_catalog().context("Failed to build the tool catalog")?;
    tracing::info!(tools = registry.len(), "Tool catalog ready");
    let server = Arc::new(McpServer::new(Dispatcher::new(Arc::new(registry), client)));

    let config = args.server_config();
    tracing::info!("Starting SonarQube MCP server ({})", config.transport.name());

    match config.transport {
        Transport::Stdio => {
            let options = StdioOptions {
                max_in_flight: config.stdio_concurrency,
            };
            serve_stdio(Session::new(server), options).await?;
        }
        Transport::Sse | Transport::StreamableHttp => {
            let state = AppState::new(server).with_session_idle(config.session_idle);
            api::serve(&config.bind_addr(), state, config.transport).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr; stdout belongs to the stdio binding.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sonarqube_mcp=info,sonarqube_sdk=info,tower_http=info".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
