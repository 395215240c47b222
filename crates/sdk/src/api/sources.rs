//! Source code endpoints. Files are addressed by `<project key>:<path>`.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::transport::BackendRequest;
use serde_json::Value;

/// Sources API.
pub struct SourcesApi<'a> {
    client: &'a SonarClient,
}

/// Optional 1-based, inclusive line range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineRange {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl LineRange {
    fn apply(&self, request: BackendRequest) -> BackendRequest {
        request.opt_param("from", self.from).opt_param("to", self.to)
    }
}

/// Key of a file inside a project.
pub fn file_key(project_key: &str, file_path: &str) -> String {
    format!("{}:{}", project_key, file_path)
}

impl<'a> SourcesApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// Source lines with line numbers.
    pub async fn lines(&self, file_key: &str, range: LineRange) -> ApiResult<Value> {
        let request = range.apply(BackendRequest::get("api/sources/lines").param("key", file_key));
        self.client.http.get_json(request).await
    }

    /// SCM author, date and revision per line.
    pub async fn scm(&self, file_key: &str, range: LineRange, commits_by_line: bool) -> ApiResult<Value> {
        let request = range.apply(
            BackendRequest::get("api/sources/scm")
                .param("key", file_key)
                .param("commits_by_line", commits_by_line),
        );
        self.client.http.get_json(request).await
    }

    /// Raw file content.
    pub async fn raw(&self, file_key: &str) -> ApiResult<String> {
        self.client
            .http
            .get_text(BackendRequest::get("api/sources/raw").param("key", file_key))
            .await
    }

    /// Code snippets around the locations of an issue.
    pub async fn issue_snippets(&self, issue_key: &str) -> ApiResult<Value> {
        self.client
            .http
            .get_json(BackendRequest::get("api/sources/issue_snippets").param("issueKey", issue_key))
            .await
    }
}
