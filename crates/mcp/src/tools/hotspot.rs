// Security hotspot tools

use super::registry::ToolDefinition;
use super::schema::{Arguments, FieldKind, ParamSchema};
use super::{Payload, ToolKind};
use sonarqube_sdk::api::HotspotSearch;
use sonarqube_sdk::{ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotspotTool {
    Search,
    Detail,
}

impl HotspotTool {
    pub const ALL: [Self; 2] = [Self::Search, Self::Detail];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::Hotspot(self);
        match self {
            Self::Search => ToolDefinition::new(
                "get_project_hotspots",
                "Retrieve security hotspots of a SonarQube project, with optional filters.",
                ParamSchema::new()
                    .required("project_key", FieldKind::String, "Key of the project (e.g., 'my_project').")
                    .optional("file_paths", FieldKind::String, "Comma-separated file paths to filter hotspots.")
                    .optional("only_mine", FieldKind::Boolean, "If true, return only hotspots assigned to the current user.")
                    .optional(
                        "resolution",
                        FieldKind::one_of(&["FIXED", "SAFE", "ACKNOWLEDGED"]),
                        "Filter by resolution.",
                    )
                    .optional(
                        "status",
                        FieldKind::one_of(&["TO_REVIEW", "REVIEWED"]),
                        "Filter by status.",
                    )
                    .paged(),
                kind,
            ),
            Self::Detail => ToolDefinition::new(
                "get_hotspot_detail",
                "Retrieve the details of a security hotspot: rule, location, status and comments.",
                ParamSchema::new().required("hotspot_key", FieldKind::String, "Key of the hotspot."),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        let api = client.hotspots();
        let body = match self {
            Self::Search => {
                let search = HotspotSearch {
                    project_key: args.str("project_key").to_string(),
                    file_paths: args.opt_string("file_paths"),
                    only_mine: args.opt_bool("only_mine"),
                    resolution: args.opt_string("resolution"),
                    status: args.opt_string("status"),
                };
                api.search(&search, args.page_request()).await?
            }
            Self::Detail => api.show(args.str("hotspot_key")).await?,
        };
        Ok(Payload::Json(body))
    }
}
