// Metric and measure tools

use super::registry::ToolDefinition;
use super::schema::{Arguments, FieldKind, ParamSchema};
use super::{Payload, ToolKind};
use sonarqube_sdk::{ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricTool {
    Types,
    Search,
    ComponentMeasures,
}

impl MetricTool {
    pub const ALL: [Self; 3] = [Self::Types, Self::Search, Self::ComponentMeasures];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::Metric(self);
        match self {
            Self::Types => ToolDefinition::new(
                "get_metrics_type",
                "List all available metric types (INT, FLOAT, PERCENT, ...).",
                ParamSchema::new(),
                kind,
            ),
            Self::Search => ToolDefinition::new(
                "get_metrics",
                "Search metric definitions, both built-in and custom.",
                ParamSchema::new().paged(),
                kind,
            ),
            Self::ComponentMeasures => ToolDefinition::new(
                "get_component_measures",
                "Retrieve the current values of metrics (e.g., ncloc, coverage, bugs) on a project, directory or file.",
                ParamSchema::new()
                    .required("component", FieldKind::String, "Component key (e.g., 'my_project' or 'my_project:src/main.rs').")
                    .required(
                        "metric_keys",
                        FieldKind::array_of(FieldKind::String),
                        "Metric keys to read (e.g., ['ncloc', 'coverage']).",
                    ),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        let body = match self {
            Self::Types => client.metrics().types().await?,
            Self::Search => client.metrics().search(args.page_request()).await?,
            Self::ComponentMeasures => {
                client
                    .measures()
                    .component(args.str("component"), &args.strings("metric_keys"))
                    .await?
            }
        };
        Ok(Payload::Json(body))
    }
}
