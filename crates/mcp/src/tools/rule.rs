// Coding rule tools

use super::registry::ToolDefinition;
use super::schema::{Arguments, FieldKind, ParamSchema};
use super::{Payload, ToolKind};
use serde_json::json;
use sonarqube_sdk::api::RuleSearch;
use sonarqube_sdk::{ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTool {
    Search,
    Details,
}

impl RuleTool {
    pub const ALL: [Self; 2] = [Self::Search, Self::Details];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::Rule(self);
        match self {
            Self::Search => ToolDefinition::new(
                "get_rules",
                "Search coding rules by severity, status, language or type.",
                ParamSchema::new()
                    .optional("severities", FieldKind::String, "Comma-separated severities: INFO, MINOR, MAJOR, CRITICAL, BLOCKER.")
                    .optional("statuses", FieldKind::String, "Comma-separated statuses: BETA, DEPRECATED, READY, REMOVED.")
                    .optional("languages", FieldKind::String, "Comma-separated languages (e.g., 'java,js').")
                    .optional("types", FieldKind::String, "Comma-separated types: CODE_SMELL, BUG, VULNERABILITY, SECURITY_HOTSPOT.")
                    .paged(),
                kind,
            ),
            Self::Details => ToolDefinition::new(
                "get_rule_details",
                "Retrieve the description and parameters of a rule.",
                ParamSchema::new()
                    .required("rule_key", FieldKind::String, "Key of the rule (e.g., 'java:S1144').")
                    .with_default("actives", FieldKind::Boolean, json!(false), "If true, include the quality profiles activating the rule."),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        let api = client.rules();
        let body = match self {
            Self::Search => {
                let search = RuleSearch {
                    severities: args.opt_string("severities"),
                    statuses: args.opt_string("statuses"),
                    languages: args.opt_string("languages"),
                    types: args.opt_string("types"),
                };
                api.search(&search, args.page_request()).await?
            }
            Self::Details => api.show(args.str("rule_key"), args.bool("actives")).await?,
        };
        Ok(Payload::Json(body))
    }
}
