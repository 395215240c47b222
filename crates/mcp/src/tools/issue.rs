// Issue tools

use super::registry::ToolDefinition;
use super::schema::{Arguments, FieldKind, ParamSchema};
use super::{Payload, ToolKind};
use sonarqube_sdk::api::IssueSearch;
use sonarqube_sdk::{ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueTool {
    Search,
    Authors,
}

impl IssueTool {
    pub const ALL: [Self; 2] = [Self::Search, Self::Authors];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::Issue(self);
        match self {
            Self::Search => ToolDefinition::new(
                "get_issues",
                "Search for issues in SonarQube projects with detailed filters. A component can be \
                 a project (project key), a directory (project key:directory) or a file \
                 (project key:file path). Set fetch_all to collect every matching issue instead \
                 of a single page.",
                ParamSchema::new()
                    .optional("project", FieldKind::String, "Project key; shortcut for components when components is not given.")
                    .optional("additional_fields", FieldKind::String, "Comma-separated fields: _all, comments, languages, rules, etc.")
                    .optional("assigned", FieldKind::Boolean, "True for assigned, false for unassigned issues.")
                    .optional("assignees", FieldKind::String, "Comma-separated assignee logins (e.g., 'user1,__me__').")
                    .optional("authors", FieldKind::String, "Comma-separated SCM author accounts.")
                    .optional("components", FieldKind::String, "Comma-separated component keys (project, directory, file).")
                    .optional("issue_statuses", FieldKind::String, "Comma-separated statuses: OPEN, CONFIRMED, FALSE_POSITIVE, ACCEPTED, FIXED.")
                    .optional("issues", FieldKind::String, "Comma-separated issue keys.")
                    .optional("resolutions", FieldKind::String, "Comma-separated resolutions: FALSE-POSITIVE, WONTFIX, FIXED, REMOVED.")
                    .optional("resolved", FieldKind::Boolean, "True for resolved, false for unresolved issues.")
                    .optional("scopes", FieldKind::String, "Comma-separated scopes: MAIN, TEST.")
                    .optional("severities", FieldKind::String, "Comma-separated severities: INFO, MINOR, MAJOR, CRITICAL, BLOCKER.")
                    .optional("tags", FieldKind::String, "Comma-separated tags (e.g., 'security,bug').")
                    .optional("types", FieldKind::String, "Comma-separated types: CODE_SMELL, BUG, VULNERABILITY.")
                    .with_default(
                        "fetch_all",
                        FieldKind::Boolean,
                        serde_json::json!(false),
                        "Collect every matching issue (bounded by the server item cap); page and page_size are ignored.",
                    )
                    .paged(),
                kind,
            ),
            Self::Authors => ToolDefinition::new(
                "get_issues_authors",
                "List the SCM authors of issues, optionally for one project.",
                ParamSchema::new()
                    .optional("project_key", FieldKind::String, "Key of the project (e.g., 'my_project').")
                    .paged(),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        let api = client.issues();
        let body = match self {
            Self::Search => {
                let search = search_filters(args);
                if args.bool("fetch_all") {
                    api.search_all(&search).await?
                } else {
                    api.search(&search, args.page_request()).await?
                }
            }
            Self::Authors => {
                api.authors(args.opt_str("project_key"), args.page_request())
                    .await?
            }
        };
        Ok(Payload::Json(body))
    }
}

fn search_filters(args: &Arguments) -> IssueSearch {
    IssueSearch {
        additional_fields: args.opt_string("additional_fields"),
        assigned: args.opt_bool("assigned"),
        assignees: args.opt_string("assignees"),
        authors: args.opt_string("authors"),
        components: args
            .opt_string("components")
            .or_else(|| args.opt_string("project")),
        issue_statuses: args.opt_string("issue_statuses"),
        issues: args.opt_string("issues"),
        resolutions: args.opt_string("resolutions"),
        resolved: args.opt_bool("resolved"),
        scopes: args.opt_string("scopes"),
        severities: args.opt_string("severities"),
        tags: args.opt_string("tags"),
        types: args.opt_string("types"),
    }
}
