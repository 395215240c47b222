// System tools

use super::registry::ToolDefinition;
use super::schema::{Arguments, ParamSchema};
use super::{Payload, ToolKind};
use sonarqube_sdk::{ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTool {
    Status,
    Health,
    Ping,
}

impl SystemTool {
    pub const ALL: [Self; 3] = [Self::Status, Self::Health, Self::Ping];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::System(self);
        match self {
            Self::Status => ToolDefinition::new(
                "get_system_status",
                "Get the state of the SonarQube server: id, version and status (STARTING, UP, DOWN, ...).",
                ParamSchema::new(),
                kind,
            ),
            Self::Health => ToolDefinition::new(
                "get_system_health",
                "Get the health of the SonarQube server (GREEN, YELLOW, RED) with the causes of degradation.",
                ParamSchema::new(),
                kind,
            ),
            Self::Ping => ToolDefinition::new(
                "ping_system",
                "Check that the SonarQube server is alive; answers 'pong'.",
                ParamSchema::new(),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, _args: &Arguments) -> ApiResult<Payload> {
        let api = client.system();
        let payload = match self {
            Self::Status => Payload::Json(api.status().await?),
            Self::Health => Payload::Json(api.health().await?),
            Self::Ping => Payload::Text(api.ping().await?),
        };
        Ok(payload)
    }
}
