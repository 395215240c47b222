// Permission tools. A missing project key targets global permissions.

use super::registry::ToolDefinition;
use super::schema::{Arguments, FieldKind, ParamSchema};
use super::{Payload, ToolKind};
use sonarqube_sdk::api::PermissionTarget;
use sonarqube_sdk::{ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionTool {
    AddGroup,
    RemoveGroup,
    ListGroups,
    AddUser,
    RemoveUser,
    ListUsers,
}

const PERMISSION_DESCRIPTION: &str =
    "Permission (global: admin, gateadmin, profileadmin, provisioning, scan; project: admin, codeviewer, issueadmin, securityhotspotadmin, scan, user).";
const PROJECT_DESCRIPTION: &str = "Project key for a project-level permission; omit for global.";

impl PermissionTool {
    pub const ALL: [Self; 6] = [
        Self::AddGroup,
        Self::RemoveGroup,
        Self::ListGroups,
        Self::AddUser,
        Self::RemoveUser,
        Self::ListUsers,
    ];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::Permission(self);
        let change = |subject: &'static str, description: &'static str| {
            ParamSchema::new()
                .required(subject, FieldKind::String, description)
                .required("permission", FieldKind::String, PERMISSION_DESCRIPTION)
                .optional("project_key", FieldKind::String, PROJECT_DESCRIPTION)
        };
        let list = || {
            ParamSchema::new()
                .optional("project_key", FieldKind::String, "Project key; omit for global permissions.")
                .paged()
        };

        match self {
            Self::AddGroup => ToolDefinition::new(
                "add_group_permission",
                "Grant a permission to a group, globally or on a project.",
                change("group_name", "Name of the group to receive the permission."),
                kind,
            ),
            Self::RemoveGroup => ToolDefinition::new(
                "remove_group_permission",
                "Revoke a permission from a group, globally or on a project.",
                change("group_name", "Name of the group to remove the permission from."),
                kind,
            ),
            Self::ListGroups => ToolDefinition::new(
                "get_group_permission",
                "List groups and the permissions they hold, globally or on a project.",
                list(),
                kind,
            ),
            Self::AddUser => ToolDefinition::new(
                "add_user_permission",
                "Grant a permission to a user, globally or on a project.",
                change("username", "Login of the user to receive the permission."),
                kind,
            ),
            Self::RemoveUser => ToolDefinition::new(
                "remove_user_permission",
                "Revoke a permission from a user, globally or on a project.",
                change("username", "Login of the user to remove the permission from."),
                kind,
            ),
            Self::ListUsers => ToolDefinition::new(
                "get_user_permission",
                "List users and the permissions they hold, globally or on a project.",
                list(),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        let api = client.permissions();
        let permission = args.str("permission");
        let project_key = args.opt_str("project_key");

        let body = match self {
            Self::AddGroup => api.add(&group(args), permission, project_key).await?,
            Self::RemoveGroup => api.remove(&group(args), permission, project_key).await?,
            Self::ListGroups => api.groups(project_key, args.page_request()).await?,
            Self::AddUser => api.add(&user(args), permission, project_key).await?,
            Self::RemoveUser => api.remove(&user(args), permission, project_key).await?,
            Self::ListUsers => api.users(project_key, args.page_request()).await?,
        };
        Ok(Payload::Json(body))
    }
}

fn group(args: &Arguments) -> PermissionTarget {
    PermissionTarget::Group(args.str("group_name").to_string())
}

fn user(args: &Arguments) -> PermissionTarget {
    PermissionTarget::User(args.str("username").to_string())
}
