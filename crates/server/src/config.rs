use serde::Serialize;
use sonarqube_mcp::protocol::JsonRpcResponse;
use sonarqube_mcp::{McpServer, Session};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Idle time after which an unused streamable HTTP session is dropped.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// Which binding the process serves. Exactly one per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    Stdio,
    Sse,
    StreamableHttp,
}

impl Transport {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Sse => "sse",
            Self::StreamableHttp => "streamable-http",
        }
    }
}

/// Process surface settings resolved from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    /// Frames kept in flight by the stdio binding.
    pub stdio_concurrency: usize,
    /// Idle time before a streamable HTTP session is reclaimed.
    pub session_idle: Duration,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        // Bare IPv6 literals need brackets
        match self.host.parse::<std::net::IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }
}

/// Session ids to live sessions, shared by the handlers of one binding.
/// Every lookup counts as activity for the idle sweep.
#[derive(Debug)]
pub struct SessionTable<T> {
    entries: Mutex<HashMap<String, Entry<T>>>,
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    last_seen: Instant,
}

impl<T: Clone> SessionTable<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, id: impl Into<String>, value: T) {
        let entry = Entry {
            value,
            last_seen: Instant::now(),
        };
        self.lock().insert(id.into(), entry);
    }

    pub fn get(&self, id: &str) -> Option<T> {
        let mut entries = self.lock();
        let entry = entries.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.value.clone())
    }

    pub fn remove(&self, id: &str) -> Option<T> {
        self.lock().remove(id).map(|entry| entry.value)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Remove and return entries unseen for `max_idle` that are not `busy`.
    pub fn expire_idle(&self, max_idle: Duration, busy: impl Fn(&T) -> bool) -> Vec<(String, T)> {
        let now = Instant::now();
        let mut entries = self.lock();
        let idle: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| {
                now.duration_since(entry.last_seen) >= max_idle && !busy(&entry.value)
            })
            .map(|(id, _)| id.clone())
            .collect();

        idle.into_iter()
            .filter_map(|id| entries.remove(&id).map(|entry| (id, entry.value)))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for SessionTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An open event stream: the session plus the channel feeding its
/// `message` events.
#[derive(Debug, Clone)]
pub struct SseSession {
    pub session: Session,
    pub replies: mpsc::Sender<JsonRpcResponse>,
}

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub server: Arc<McpServer>,
    pub sse_sessions: Arc<SessionTable<SseSession>>,
    pub http_sessions: Arc<SessionTable<Session>>,
    pub session_idle: Duration,
}

impl AppState {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self {
            server,
            sse_sessions: Arc::new(SessionTable::new()),
            http_sessions: Arc::new(SessionTable::new()),
            session_idle: DEFAULT_SESSION_IDLE,
        }
    }

    pub fn with_session_idle(mut self, session_idle: Duration) -> Self {
        self.session_idle = session_idle;
        self
    }

    /// A fresh session over the shared protocol handler.
    pub fn open_session(&self) -> Session {
        Session::new(self.server.clone())
    }

    /// Close streamable HTTP sessions nobody has used for `session_idle`.
    /// Sessions with calls still in flight are kept.
    pub fn reap_idle_http_sessions(&self) -> usize {
        let expired = self
            .http_sessions
            .expire_idle(self.session_idle, |session| !session.in_flight().is_empty());
        for (session_id, session) in &expired {
            session.close();
            tracing::info!(session_id = %session_id, "HTTP session expired");
        }
        expired.len()
    }
}
