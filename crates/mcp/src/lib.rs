//! # SonarQube MCP
//!
//! Model Context Protocol server exposing the SonarQube Web API as tools.
//!
//! - [`tools`]: the tool catalog, parameter schemas and registry
//! - [`dispatcher`]: validation, execution and failure classification
//! - [`server`]: JSON-RPC method handling
//! - [`session`]: per-client in-flight tracking and cancellation
//! - [`transport`]: the stdio binding
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sonarqube_mcp::{Dispatcher, McpServer, Session, ToolRegistry};
//! use sonarqube_mcp::transport::{serve_stdio, StdioOptions};
//! use sonarqube_sdk::{SonarClient, SonarConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = SonarClient::from_config(SonarConfig::from_env()?)?;
//! let registry = Arc::new(ToolRegistry::with_catalog()?);
//! let server = Arc::new(McpServer::new(Dispatcher::new(registry, client)));
//!
//! serve_stdio(Session::new(server), StdioOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;

pub use dispatcher::{Dispatcher, FailureKind, ToolFailure, ToolInvocation, ToolResult};
pub use server::McpServer;
pub use session::{InFlight, Session};
pub use tools::{Payload, RegistryError, ToolDefinition, ToolKind, ToolRegistry};
