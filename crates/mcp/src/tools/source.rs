// Source code tools. Files are addressed by project key plus path.

use super::registry::ToolDefinition;
use super::schema::{Arguments, FieldKind, ParamSchema};
use super::{Payload, ToolKind};
use futures::future::join_all;
use serde_json::{json, Map, Value};
use sonarqube_sdk::api::sources::file_key;
use sonarqube_sdk::api::{IssueSearch, LineRange};
use sonarqube_sdk::{ApiError, ApiResult, SonarClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTool {
    Lines,
    Scm,
    Raw,
    IssueSnippets,
    FileIssues,
}

const PROJECT_KEY: &str = "Key of the project (e.g., 'my_project').";
const FILE_PATH: &str = "Path to the file within the project (e.g., 'src/main.java').";

impl SourceTool {
    pub const ALL: [Self; 5] = [
        Self::Lines,
        Self::Scm,
        Self::Raw,
        Self::IssueSnippets,
        Self::FileIssues,
    ];

    pub fn definition(self) -> ToolDefinition {
        let kind = ToolKind::Source(self);
        let file = || {
            ParamSchema::new()
                .required("project_key", FieldKind::String, PROJECT_KEY)
                .required("file_path", FieldKind::String, FILE_PATH)
        };
        let ranged = || {
            file()
                .optional("start", FieldKind::integer_at_least(1), "Starting line number.")
                .optional("end", FieldKind::integer_at_least(1), "Ending line number (>= start).")
        };

        match self {
            Self::Lines => ToolDefinition::new(
                "get_source",
                "Retrieve the source lines of a file, with line numbers, optionally limited to a range.",
                ranged(),
                kind,
            ),
            Self::Scm => ToolDefinition::new(
                "get_scm_info",
                "Retrieve SCM information (author, date, revision) for the lines of a file.",
                ranged().with_default(
                    "commits_by_line",
                    FieldKind::Boolean,
                    json!(false),
                    "If true, report the commit of every line; if false, group consecutive lines by commit.",
                ),
                kind,
            ),
            Self::Raw => ToolDefinition::new(
                "get_source_raw",
                "Retrieve the raw source of a file as plain text.",
                file(),
                kind,
            ),
            Self::IssueSnippets => ToolDefinition::new(
                "get_source_issue_snippets",
                "Retrieve the source snippets around the locations of an issue.",
                ParamSchema::new().required("issue_key", FieldKind::String, "Key of the issue."),
                kind,
            ),
            Self::FileIssues => ToolDefinition::new(
                "get_file_issues_information",
                "Retrieve the issues of a file together with their rule details, the code snippets \
                 around each issue and, optionally, the full file source, as context for fixing them.",
                file()
                    .with_default("include_source", FieldKind::Boolean, json!(true), "Whether to include the raw source of the file.")
                    .paged(),
                kind,
            ),
        }
    }

    pub async fn execute(self, client: &SonarClient, args: &Arguments) -> ApiResult<Payload> {
        let sources = client.sources();
        let key = file_key(args.str("project_key"), args.str("file_path"));

        let payload = match self {
            Self::Lines => Payload::Json(sources.lines(&key, line_range(args)).await?),
            Self::Scm => Payload::Json(
                sources
                    .scm(&key, line_range(args), args.bool("commits_by_line"))
                    .await?,
            ),
            Self::Raw => Payload::Text(sources.raw(&key).await?),
            Self::IssueSnippets => {
                Payload::Json(sources.issue_snippets(args.str("issue_key")).await?)
            }
            Self::FileIssues => Payload::Json(file_issues(client, args, &key).await?),
        };
        Ok(payload)
    }
}

fn line_range(args: &Arguments) -> LineRange {
    LineRange {
        from: args.opt_u64("start"),
        to: args.opt_u64("end"),
    }
}

/// One page of the file's issues, each joined with its rule and snippets.
async fn file_issues(client: &SonarClient, args: &Arguments, key: &str) -> ApiResult<Value> {
    let search = IssueSearch {
        components: Some(key.to_string()),
        additional_fields: Some("rules".to_string()),
        ..Default::default()
    };
    let page = client.issues().search(&search, args.page_request()).await?;

    let rules: Map<String, Value> = page["rules"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|rule| Some((rule["key"].as_str()?.to_string(), rule.clone())))
        .collect();
    let issues = page["issues"].as_array().cloned().unwrap_or_default();

    let sources = client.sources();
    let snippets = join_all(issues.iter().map(|issue| {
        let issue_key = issue["key"].as_str().unwrap_or_default().to_string();
        let sources = &sources;
        async move { sources.issue_snippets(&issue_key).await }
    }))
    .await;

    let mut entries = Vec::with_capacity(issues.len());
    for (issue, snippet) in issues.into_iter().zip(snippets) {
        let snippet = match snippet {
            Ok(body) => with_line_bounds(body),
            // Closed issues have no snippets left
            Err(ApiError::NotFound { .. }) => Value::Null,
            Err(e) => return Err(e),
        };
        let rule = issue["rule"]
            .as_str()
            .and_then(|k| rules.get(k))
            .cloned()
            .unwrap_or(Value::Null);
        entries.push(json!({ "issue": issue, "rule": rule, "snippets": snippet }));
    }

    let source = if args.bool("include_source") {
        Value::String(client.sources().raw(key).await?)
    } else {
        Value::Null
    };

    Ok(json!({
        "component": key,
        "paging": page.get("paging").cloned().unwrap_or(Value::Null),
        "total": page.get("total").cloned().unwrap_or(Value::Null),
        "issues": entries,
        "source": source,
    }))
}

/// Fill in `startLine` / `endLine` of snippet blocks that omit them, from
/// the line numbers of their source lines.
fn with_line_bounds(mut body: Value) -> Value {
    if let Value::Object(components) = &mut body {
        for block in components.values_mut() {
            let Some(block) = block.as_object_mut() else {
                continue;
            };
            let lines: Vec<u64> = block
                .get("sources")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|line| line["line"].as_u64())
                .collect();
            if let (Some(first), Some(last)) = (lines.iter().min(), lines.iter().max()) {
                block.entry("startLine").or_insert_with(|| json!(first));
                block.entry("endLine").or_insert_with(|| json!(last));
            }
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args_for, client_for};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_lines_with_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sources/lines"))
            .and(query_param("key", "demo:src/lib.rs"))
            .and(query_param("from", "3"))
            .and(query_param("to", "9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sources": []})))
            .expect(1)
            .mount(&server)
            .await;

        let args = args_for(
            ToolKind::Source(SourceTool::Lines),
            json!({"project_key": "demo", "file_path": "src/lib.rs", "start": 3, "end": 9}),
        );
        SourceTool::Lines.execute(&client_for(&server), &args).await.unwrap();
    }

    #[tokio::test]
    async fn test_large_line_numbers_are_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sources/lines"))
            .and(query_param("from", "5000000000"))
            .and(query_param("to", "5000000010"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sources": []})))
            .expect(1)
            .mount(&server)
            .await;

        let args = args_for(
            ToolKind::Source(SourceTool::Lines),
            json!({"project_key": "demo", "file_path": "src/lib.rs",
                   "start": 5_000_000_000u64, "end": 5_000_000_010u64}),
        );
        SourceTool::Lines.execute(&client_for(&server), &args).await.unwrap();
    }

    #[tokio::test]
    async fn test_raw_is_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sources/raw"))
            .and(query_param("key", "demo:src/lib.rs"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fn main() {}\n"))
            .mount(&server)
            .await;

        let args = args_for(
            ToolKind::Source(SourceTool::Raw),
            json!({"project_key": "demo", "file_path": "src/lib.rs"}),
        );
        let payload = SourceTool::Raw.execute(&client_for(&server), &args).await.unwrap();
        assert_eq!(payload, Payload::Text("fn main() {}\n".to_string()));
    }

    #[tokio::test]
    async fn test_file_issues_joins_rules_and_snippets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/issues/search"))
            .and(query_param("components", "demo:src/lib.rs"))
            .and(query_param("additionalFields", "rules"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "paging": {"pageIndex": 1, "pageSize": 20, "total": 2},
                "issues": [
                    {"key": "i1", "rule": "rust:S1"},
                    {"key": "i2", "rule": "rust:S2"},
                ],
                "rules": [{"key": "rust:S1", "name": "Unused variable"}],
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/sources/issue_snippets"))
            .and(query_param("issueKey", "i1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "demo:src/lib.rs": {"sources": [{"line": 4}, {"line": 5}, {"line": 6}]}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/sources/issue_snippets"))
            .and(query_param("issueKey", "i2"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/sources/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_string("let x = 1;"))
            .expect(1)
            .mount(&server)
            .await;

        let args = args_for(
            ToolKind::Source(SourceTool::FileIssues),
            json!({"project_key": "demo", "file_path": "src/lib.rs"}),
        );
        let Payload::Json(body) = SourceTool::FileIssues
            .execute(&client_for(&server), &args)
            .await
            .unwrap()
        else {
            panic!("expected JSON payload");
        };

        assert_eq!(body["component"], json!("demo:src/lib.rs"));
        assert_eq!(body["issues"][0]["rule"]["name"], json!("Unused variable"));
        assert_eq!(body["issues"][0]["snippets"]["demo:src/lib.rs"]["startLine"], json!(4));
        assert_eq!(body["issues"][0]["snippets"]["demo:src/lib.rs"]["endLine"], json!(6));
        assert_eq!(body["issues"][1]["rule"], Value::Null);
        assert_eq!(body["issues"][1]["snippets"], Value::Null);
        assert_eq!(body["source"], json!("let x = 1;"));
    }

    #[tokio::test]
    async fn test_file_issues_without_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/issues/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "paging": {"pageIndex": 1, "pageSize": 20, "total": 0},
                "issues": [],
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/sources/raw"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let args = args_for(
            ToolKind::Source(SourceTool::FileIssues),
            json!({"project_key": "demo", "file_path": "src/lib.rs", "include_source": false}),
        );
        let Payload::Json(body) = SourceTool::FileIssues
            .execute(&client_for(&server), &args)
            .await
            .unwrap()
        else {
            panic!("expected JSON payload");
        };
        assert_eq!(body["issues"], json!([]));
        assert_eq!(body["source"], Value::Null);
    }

    #[test]
    fn test_existing_bounds_are_kept() {
        let body = with_line_bounds(json!({
            "k": {"startLine": 1, "endLine": 2, "sources": [{"line": 7}]}
        }));
        assert_eq!(body["k"]["startLine"], json!(1));
        assert_eq!(body["k"]["endLine"], json!(2));
    }
}
