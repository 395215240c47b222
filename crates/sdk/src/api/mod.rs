//! Endpoint groups of the SonarQube Web API.

pub mod hotspots;
pub mod issues;
pub mod measures;
pub mod metrics;
pub mod permissions;
pub mod projects;
pub mod quality_gates;
pub mod quality_profiles;
pub mod rules;
pub mod sources;
pub mod system;

pub use hotspots::{HotspotSearch, HotspotsApi};
pub use issues::{IssueSearch, IssuesApi};
pub use measures::MeasuresApi;
pub use metrics::MetricsApi;
pub use permissions::{PermissionTarget, PermissionsApi};
pub use projects::{NewProject, ProjectSearch, ProjectsApi};
pub use quality_gates::{GateStatusQuery, QualityGatesApi};
pub use quality_profiles::{ProfileAssociation, QualityProfilesApi};
pub use rules::{RuleSearch, RulesApi};
pub use sources::{LineRange, SourcesApi};
pub use system::{ConnectivityReport, SystemApi};

use crate::transport::BackendResponse;
use serde_json::{json, Value};

/// Mutating endpoints mostly answer `204 No Content`; report the outcome
/// instead of an empty body.
pub(crate) fn acknowledge(response: BackendResponse) -> crate::error::ApiResult<Value> {
    let status = response.status;
    match response.into_json()? {
        Value::Null => Ok(json!({ "success": true, "status": status })),
        body => Ok(body),
    }
}
