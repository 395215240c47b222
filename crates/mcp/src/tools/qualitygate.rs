// Quality gate tools

use super::registry::ToolDefinition;
use super::schema::{Arguments, FieldKind, ParamSchema};
use super::{Payload, ToolKind};
use sonarqube_sdk::api::GateStatusQuery;
use sonarqube_sdk::{ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityGateTool {
    List,
    Show,
    ProjectStatus,
    Select,
    Deselect,
}

impl QualityGateTool {
    pub const ALL: [Self; 5] = [
        Self::List,
        Self::Show,
        Self::ProjectStatus,
        Self::Select,
        Self::Deselect,
    ];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::QualityGate(self);
        match self {
            Self::List => ToolDefinition::new(
                "get_quality_gates",
                "List all quality gates.",
                ParamSchema::new(),
                kind,
            ),
            Self::Show => ToolDefinition::new(
                "get_quality_gate",
                "Show the conditions of a quality gate.",
                ParamSchema::new().required("name", FieldKind::String, "Name of the quality gate."),
                kind,
            ),
            Self::ProjectStatus => ToolDefinition::new(
                "get_project_quality_gate_status",
                "Get the quality gate status of a project or an analysis. Provide exactly one of \
                 project_key or analysis_id; branch and pull_request narrow a project lookup.",
                ParamSchema::new()
                    .optional("project_key", FieldKind::String, "Key of the project.")
                    .optional("analysis_id", FieldKind::String, "Analysis id.")
                    .optional("branch", FieldKind::String, "Branch key.")
                    .optional("pull_request", FieldKind::String, "Pull request id."),
                kind,
            ),
            Self::Select => ToolDefinition::new(
                "select_quality_gate",
                "Associate a project with a quality gate.",
                ParamSchema::new()
                    .required("project_key", FieldKind::String, "Key of the project.")
                    .required("gate_name", FieldKind::String, "Name of the quality gate."),
                kind,
            ),
            Self::Deselect => ToolDefinition::new(
                "deselect_quality_gate",
                "Remove the quality gate association of a project; the default gate applies again.",
                ParamSchema::new().required("project_key", FieldKind::String, "Key of the project."),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        let api = client.quality_gates();
        let body = match self {
            Self::List => api.list().await?,
            Self::Show => api.show(args.str("name")).await?,
            Self::ProjectStatus => {
                let query = GateStatusQuery {
                    project_key: args.opt_string("project_key"),
                    analysis_id: args.opt_string("analysis_id"),
                    branch: args.opt_string("branch"),
                    pull_request: args.opt_string("pull_request"),
                };
                api.project_status(&query).await?
            }
            Self::Select => {
                api.select(args.str("gate_name"), args.str("project_key"))
                    .await?
            }
            Self::Deselect => api.deselect(args.str("project_key")).await?,
        };
        Ok(Payload::Json(body))
    }
}
