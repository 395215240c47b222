//! Transport layer for the SonarQube SDK.

pub mod http;

pub use http::{BackendRequest, BackendResponse, HttpTransport, Method, ResponseBody};
