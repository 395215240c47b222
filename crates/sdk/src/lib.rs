//! # SonarQube SDK
//!
//! Async client for the SonarQube / SonarCloud Web API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sonarqube_sdk::{SonarClient, SonarConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Resolve SONARQUBE_URL, SONARQUBE_TOKEN, ... from the environment
//! let client = SonarClient::from_config(SonarConfig::from_env()?)?;
//!
//! let status = client.system().status().await?;
//! println!("Server status: {}", status["status"]);
//! # Ok(())
//! # }
//! ```
//!
//! Every failure is an [`ApiError`] with a stable [`ApiErrorKind`]; requests
//! are never retried by the client.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod pagination;
pub mod transport;

pub use client::{SonarClient, SonarClientBuilder};
pub use config::{AuthMode, ConfigError, SonarConfig};
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use pagination::{Page, PageRequest, Pages, Paging};
