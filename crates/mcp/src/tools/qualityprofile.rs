// Quality profile tools

use super::registry::ToolDefinition;
use super::schema::{Arguments, FieldKind, ParamSchema};
use super::{Payload, ToolKind};
use serde_json::json;
use sonarqube_sdk::api::ProfileAssociation;
use sonarqube_sdk::{ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityProfileTool {
    AddProject,
    RemoveProject,
    Search,
}

impl QualityProfileTool {
    pub const ALL: [Self; 3] = [Self::AddProject, Self::RemoveProject, Self::Search];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::QualityProfile(self);
        let association = || {
            ParamSchema::new()
                .required("language", FieldKind::String, "Language of the profile (e.g., 'java', 'py').")
                .required("project_key", FieldKind::String, "Key of the project (e.g., 'my_project').")
                .required("quality_profile", FieldKind::String, "Name of the quality profile (e.g., 'Sonar way').")
        };

        match self {
            Self::AddProject => ToolDefinition::new(
                "add_quality_profile_project",
                "Associate a project with a quality profile for one language.",
                association(),
                kind,
            ),
            Self::RemoveProject => ToolDefinition::new(
                "remove_quality_profile_project",
                "Remove the association between a project and a quality profile.",
                association(),
                kind,
            ),
            Self::Search => ToolDefinition::new(
                "get_quality_profiles",
                "Search quality profiles by language, project or default flag.",
                ParamSchema::new()
                    .with_default("defaults", FieldKind::Boolean, json!(false), "If true, return default profiles only.")
                    .optional("language", FieldKind::String, "Filter by language (e.g., 'java', 'py').")
                    .optional("project_key", FieldKind::String, "Filter by project key."),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        let api = client.quality_profiles();
        let body = match self {
            Self::AddProject => api.add_project(&association(args)).await?,
            Self::RemoveProject => api.remove_project(&association(args)).await?,
            Self::Search => {
                api.search(
                    args.bool("defaults"),
                    args.opt_str("language"),
                    args.opt_str("project_key"),
                )
                .await?
            }
        };
        Ok(Payload::Json(body))
    }
}

fn association(args: &Arguments) -> ProfileAssociation {
    ProfileAssociation {
        language: args.str("language").to_string(),
        project_key: args.str("project_key").to_string(),
        quality_profile: args.str("quality_profile").to_string(),
    }
}
