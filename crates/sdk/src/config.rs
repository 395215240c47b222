//! Configuration types for the SonarQube SDK.
//!
//! The configuration is resolved once at process start, usually from the
//! environment, and shared read-only by every request afterwards.

use std::fmt;
use std::time::Duration;
use url::Url;

/// Server URL used when `SONARQUBE_URL` is not set.
pub const DEFAULT_URL: &str = "http://localhost:9000";
/// Per-request timeout used when `SONARQUBE_TIMEOUT_SECS` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Aggregation cap used when `SONARQUBE_MAX_ITEMS` is not set.
pub const DEFAULT_MAX_ITEMS: usize = 500;

pub const ENV_URL: &str = "SONARQUBE_URL";
pub const ENV_TOKEN: &str = "SONARQUBE_TOKEN";
pub const ENV_USERNAME: &str = "SONARQUBE_USERNAME";
pub const ENV_PASSWORD: &str = "SONARQUBE_PASSWORD";
pub const ENV_ORGANIZATION: &str = "SONARQUBE_ORGANIZATION";
pub const ENV_TIMEOUT_SECS: &str = "SONARQUBE_TIMEOUT_SECS";
pub const ENV_MAX_ITEMS: &str = "SONARQUBE_MAX_ITEMS";

/// Credential strategy applied to every outbound request.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// User token, sent as the basic-auth user name with an empty password.
    Token(String),
    /// Login and password, sent as a basic credential.
    Basic { username: String, password: String },
    /// Anonymous access.
    None,
}

impl AuthMode {
    /// Stable name of the mode, safe to log or print.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::Basic { .. } => "basic",
            Self::None => "none",
        }
    }
}

// Credentials never show up in logs or panics.
impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::None => f.write_str("None"),
        }
    }
}

/// Errors raised while resolving the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid server URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("SONARQUBE_TOKEN cannot be combined with SONARQUBE_USERNAME/SONARQUBE_PASSWORD; configure exactly one credential")]
    AmbiguousCredentials,

    #[error("{present} is set but {missing} is not")]
    IncompleteCredentials {
        present: &'static str,
        missing: &'static str,
    },

    #[error("invalid value {value:?} for {name}: expected a positive integer")]
    InvalidSetting { name: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Resolved configuration for the SonarQube client.
#[derive(Clone)]
pub struct SonarConfig {
    /// Base URL of the server, always ending with `/`.
    pub base_url: Url,
    /// Credential strategy.
    pub auth: AuthMode,
    /// Organization key, injected on organization-scoped endpoints.
    pub organization: Option<String>,
    /// Upper bound for a single request.
    pub timeout: Duration,
    /// Maximum number of items a paged call may return or aggregate.
    pub max_items: usize,
}

impl SonarConfig {
    /// Create an anonymous configuration with default limits.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            auth: AuthMode::None,
            organization: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    /// Base URL without user info, for reports and logs.
    pub fn display_url(&self) -> String {
        let mut url = self.base_url.clone();
        // Only fails for URLs that cannot carry user info at all
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.to_string()
    }

    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Validation order: URL, ambiguous
    /// credentials, incomplete credentials, numeric limits.
    pub fn resolve<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let raw_url = var(ENV_URL).unwrap_or_else(|| DEFAULT_URL.to_string());
        let base_url = parse_base_url(raw_url.trim())?;

        let auth = match (var(ENV_TOKEN), var(ENV_USERNAME), var(ENV_PASSWORD)) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(ConfigError::AmbiguousCredentials)
            }
            (Some(token), None, None) => AuthMode::Token(token.trim().to_string()),
            (None, Some(username), Some(password)) => AuthMode::Basic {
                username: username.trim().to_string(),
                password,
            },
            (None, Some(_), None) => {
                return Err(ConfigError::IncompleteCredentials {
                    present: ENV_USERNAME,
                    missing: ENV_PASSWORD,
                })
            }
            (None, None, Some(_)) => {
                return Err(ConfigError::IncompleteCredentials {
                    present: ENV_PASSWORD,
                    missing: ENV_USERNAME,
                })
            }
            (None, None, None) => AuthMode::None,
        };

        let timeout_secs = positive_setting(ENV_TIMEOUT_SECS, var(ENV_TIMEOUT_SECS))?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let max_items = positive_setting(ENV_MAX_ITEMS, var(ENV_MAX_ITEMS))?
            .map(|value| value as usize)
            .unwrap_or(DEFAULT_MAX_ITEMS);

        Ok(Self {
            base_url,
            auth,
            organization: var(ENV_ORGANIZATION).map(|org| org.trim().to_string()),
            timeout: Duration::from_secs(timeout_secs),
            max_items,
        })
    }
}

impl fmt::Debug for SonarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SonarConfig")
            .field("base_url", &self.display_url())
            .field("auth", &self.auth)
            .field("organization", &self.organization)
            .field("timeout", &self.timeout)
            .field("max_items", &self.max_items)
            .finish()
    }
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(with_trailing_slash(url))
}

// `Url::join` replaces the last path segment unless the base ends with '/'.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn positive_setting(name: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    match value {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
            _ => Err(ConfigError::InvalidSetting { name, value: raw }),
        },
    }
}
