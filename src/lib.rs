// autotask-client - client for the automation API
// Library exports

pub mod client; // HTTP client for node, workflow and assistant endpoints
pub mod config;
pub mod errors;

pub use client::{AssistantRequest, ConnectionScope, ToolsClient};
pub use errors::{ClientError, Result};
