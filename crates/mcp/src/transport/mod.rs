//! Transport bindings that run inside this crate. The HTTP bindings live
//! in the server crate.

pub mod stdio;

pub use stdio::{serve, serve_stdio, StdioOptions};
