//! SonarQube tools, grouped by Web API domain.
//!
//! Every tool is a variant of the closed [`ToolKind`] enum. A domain module
//! declares its tools (name, description, parameter schema) and executes
//! them against a [`SonarClient`].

pub mod hotspot;
pub mod issue;
pub mod metric;
pub mod permission;
pub mod project;
pub mod qualitygate;
pub mod qualityprofile;
pub mod registry;
pub mod rule;
pub mod schema;
pub mod source;
pub mod system;

pub use hotspot::HotspotTool;
pub use issue::IssueTool;
pub use metric::MetricTool;
pub use permission::PermissionTool;
pub use project::ProjectTool;
pub use qualitygate::QualityGateTool;
pub use qualityprofile::QualityProfileTool;
pub use registry::{RegistryError, ToolDefinition, ToolRegistry};
pub use rule::RuleTool;
pub use schema::{Arguments, FieldKind, FieldSpec, ParamSchema};
pub use source::SourceTool;
pub use system::SystemTool;

use serde_json::Value;
use sonarqube_sdk::{ApiResult, SonarClient};

/// What a tool hands back to the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// Handler behind a registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Hotspot(HotspotTool),
    Issue(IssueTool),
    Metric(MetricTool),
    Permission(PermissionTool),
    Project(ProjectTool),
    QualityGate(QualityGateTool),
    QualityProfile(QualityProfileTool),
    Rule(RuleTool),
    Source(SourceTool),
    System(SystemTool),
}

impl ToolKind {
    pub fn domain(&self) -> &'static str {
        match self {
            Self::Hotspot(_) => "hotspot",
            Self::Issue(_) => "issue",
            Self::Metric(_) => "metric",
            Self::Permission(_) => "permission",
            Self::Project(_) => "project",
            Self::QualityGate(_) => "qualitygate",
            Self::QualityProfile(_) => "qualityprofile",
            Self::Rule(_) => "rule",
            Self::Source(_) => "source",
            Self::System(_) => "system",
        }
    }

    pub fn definition(self) -> ToolDefinition {
        match self {
            Self::Hotspot(tool) => tool.definition(),
            Self::Issue(tool) => tool.definition(),
            Self::Metric(tool) => tool.definition(),
            Self::Permission(tool) => tool.definition(),
            Self::Project(tool) => tool.definition(),
            Self::QualityGate(tool) => tool.definition(),
            Self::QualityProfile(tool) => tool.definition(),
            Self::Rule(tool) => tool.definition(),
            Self::Source(tool) => tool.definition(),
            Self::System(tool) => tool.definition(),
        }
    }

    /// Run the tool with already validated arguments.
    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        match self {
            Self::Hotspot(tool) => tool.execute(client, args).await,
            Self::Issue(tool) => tool.execute(client, args).await,
            Self::Metric(tool) => tool.execute(client, args).await,
            Self::Permission(tool) => tool.execute(client, args).await,
            Self::Project(tool) => tool.execute(client, args).await,
            Self::QualityGate(tool) => tool.execute(client, args).await,
            Self::QualityProfile(tool) => tool.execute(client, args).await,
            Self::Rule(tool) => tool.execute(client, args).await,
            Self::Source(tool) => tool.execute(client, args).await,
            Self::System(tool) => tool.execute(client, args).await,
        }
    }
}

/// Definitions of every tool of every domain.
pub fn catalog() -> Vec<ToolDefinition> {
    let kinds = HotspotTool::ALL
        .into_iter()
        .map(ToolKind::Hotspot)
        .chain(IssueTool::ALL.into_iter().map(ToolKind::Issue))
        .chain(MetricTool::ALL.into_iter().map(ToolKind::Metric))
        .chain(PermissionTool::ALL.into_iter().map(ToolKind::Permission))
        .chain(ProjectTool::ALL.into_iter().map(ToolKind::Project))
        .chain(QualityGateTool::ALL.into_iter().map(ToolKind::QualityGate))
        .chain(QualityProfileTool::ALL.into_iter().map(ToolKind::QualityProfile))
        .chain(RuleTool::ALL.into_iter().map(ToolKind::Rule))
        .chain(SourceTool::ALL.into_iter().map(ToolKind::Source))
        .chain(SystemTool::ALL.into_iter().map(ToolKind::System));

    kinds.map(ToolKind::definition).collect()
}
