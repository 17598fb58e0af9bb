// HTTP client for the automation API
//
// Provides ToolsClient for executing nodes, running workflows and invoking
// assistants on a remote automation server.

mod connection;
mod tools_client;
mod types;

pub use tools_client::{ConnectionScope, ToolsClient};
pub use types::AssistantRequest;
