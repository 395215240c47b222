// Project tools

use super::registry::ToolDefinition;
use super::schema::{Arguments, FieldKind, ParamSchema};
use super::{Payload, ToolKind};
use serde_json::json;
use sonarqube_sdk::api::{NewProject, ProjectSearch};
use sonarqube_sdk::{ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectTool {
    Create,
    Search,
    Mine,
    Scannable,
    Analyses,
}

impl ProjectTool {
    pub const ALL: [Self; 5] = [
        Self::Create,
        Self::Search,
        Self::Mine,
        Self::Scannable,
        Self::Analyses,
    ];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::Project(self);
        match self {
            Self::Create => ToolDefinition::new(
                "create_project",
                "Create a new SonarQube project. Requires the 'Create Projects' permission.",
                ParamSchema::new()
                    .required("project_name", FieldKind::String, "Name of the project (max 500 characters).")
                    .required("project_key", FieldKind::String, "Unique key of the project (max 400 characters).")
                    .with_default("main_branch", FieldKind::String, json!("main"), "Name of the main branch.")
                    .optional(
                        "new_code_definition_type",
                        FieldKind::one_of(&["PREVIOUS_VERSION", "NUMBER_OF_DAYS", "REFERENCE_BRANCH"]),
                        "Type of new code definition.",
                    )
                    .optional(
                        "new_code_definition_value",
                        FieldKind::String,
                        "Value of the new code definition (number of days 1-90 for NUMBER_OF_DAYS).",
                    ),
                kind,
            ),
            Self::Search => ToolDefinition::new(
                "get_projects",
                "Search projects, optionally filtered by keys, name, or last analysis date.",
                ParamSchema::new()
                    .optional("projects", FieldKind::String, "Comma-separated list of project keys (e.g., 'proj1,proj2').")
                    .optional("search", FieldKind::String, "Partial project name or key to filter results.")
                    .optional(
                        "analyzed_before",
                        FieldKind::String,
                        "Only projects last analyzed before this date (YYYY-MM-DD or YYYY-MM-DDThh:mm:ssZ).",
                    )
                    .with_default(
                        "fetch_all",
                        FieldKind::Boolean,
                        json!(false),
                        "Collect every matching project (bounded by the server item cap); page and page_size are ignored.",
                    )
                    .paged(),
                kind,
            ),
            Self::Mine => ToolDefinition::new(
                "get_user_projects",
                "List the projects administered by the authenticated user.",
                ParamSchema::new().paged(),
                kind,
            ),
            Self::Scannable => ToolDefinition::new(
                "get_user_scannable_projects",
                "List the projects the authenticated user is allowed to analyze.",
                ParamSchema::new().optional(
                    "search",
                    FieldKind::String,
                    "Partial project name or key to filter results.",
                ),
                kind,
            ),
            Self::Analyses => ToolDefinition::new(
                "get_project_analyses",
                "List the analyses of a project and their events.",
                ParamSchema::new()
                    .required("project_key", FieldKind::String, "Key of the project (e.g., 'my_project').")
                    .optional(
                        "category",
                        FieldKind::one_of(&[
                            "VERSION",
                            "OTHER",
                            "QUALITY_PROFILE",
                            "QUALITY_GATE",
                            "DEFINITION_CHANGE",
                            "ISSUE_DETECTION",
                            "SQ_UPGRADE",
                        ]),
                        "Event category filter.",
                    )
                    .paged(),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        let api = client.projects();
        let body = match self {
            Self::Create => {
                let project = NewProject {
                    name: args.str("project_name").to_string(),
                    key: args.str("project_key").to_string(),
                    main_branch: args.str("main_branch").to_string(),
                    new_code_definition_type: args.opt_string("new_code_definition_type"),
                    new_code_definition_value: args.opt_string("new_code_definition_value"),
                };
                api.create(&project).await?
            }
            Self::Search => {
                let search = ProjectSearch {
                    projects: args.opt_string("projects"),
                    search: args.opt_string("search"),
                    analyzed_before: args.opt_string("analyzed_before"),
                };
                if args.bool("fetch_all") {
                    api.search_all(&search).await?
                } else {
                    api.search(&search, args.page_request()).await?
                }
            }
            Self::Mine => api.mine(args.page_request()).await?,
            Self::Scannable => api.scannable(args.opt_str("search")).await?,
            Self::Analyses => {
                api.analyses(
                    args.str("project_key"),
                    args.opt_str("category"),
                    args.page_request(),
                )
                .await?
            }
        };
        Ok(Payload::Json(body))
    }
}
