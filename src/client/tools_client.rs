// Automation API client implementation
//
// One method per endpoint. Every request goes through the client's single
// connection handle, which is opened on demand.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error};

use super::connection::{Connection, ConnectionStats};
use super::types::AssistantRequest;
use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};

/// HTTP client for the automation API (nodes, workflows, assistants)
pub struct ToolsClient {
    base_url: String,
    timeout: Option<Duration>,
    connection: Mutex<Option<Connection>>,
    stats: Arc<ConnectionStats>,
}

impl ToolsClient {
    /// Create a client for `base_url`; no connection is opened yet
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            base_url,
            timeout: None,
            connection: Mutex::new(None),
            stats: Arc::new(ConnectionStats::default()),
        }
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut client = Self::new(config.base_url.as_str());
        client.timeout = config.timeout_seconds.map(Duration::from_secs);
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open the connection if there is none. Idempotent.
    pub fn ensure_connection(&self) -> Result<()> {
        self.http().map(|_| ())
    }

    /// Drop the connection if there is one. Idempotent.
    ///
    /// Requests already in flight keep their own handle and complete.
    pub fn close_connection(&self) {
        let connection = self.slot().take();
        drop(connection);
    }

    pub fn has_connection(&self) -> bool {
        self.slot().is_some()
    }

    /// Number of connections this client has ever opened
    pub fn connections_opened(&self) -> u64 {
        self.stats.opened()
    }

    /// Number of connections currently alive, including blocking calls
    pub fn open_connections(&self) -> usize {
        self.stats.open()
    }

    /// Open the connection for the lifetime of the returned scope
    ///
    /// The connection is closed when the scope is dropped, whether the
    /// caller returns normally, bails out with `?`, or panics.
    pub fn scope(&self) -> Result<ConnectionScope<'_>> {
        self.ensure_connection()?;
        Ok(ConnectionScope { client: self })
    }

    /// Execute a node: `POST /nodes/execute/{class_path}`
    pub async fn execute<P>(&self, class_path: &str, inputs: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        let http = self.http()?;
        self.execute_on(&http, class_path, inputs).await
    }

    /// Node metadata including inputs and outputs: `GET /nodes/nodes/{class_path}`
    pub async fn describe(&self, class_path: &str) -> Result<Value> {
        let http = self.http()?;
        let url = format!("{}/nodes/nodes/{}", self.base_url, class_path);

        let info = send(&format!("describe node {}", class_path), http.get(&url)).await?;
        debug!(class_path, info = %info, "Retrieved node info");
        Ok(info)
    }

    /// Available nodes, optionally filtered: `GET /nodes/nodes[?category=]`
    pub async fn list(&self, category: Option<&str>) -> Result<Value> {
        let http = self.http()?;
        let url = format!("{}/nodes/nodes", self.base_url);

        let mut request = http.get(&url);
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            request = request.query(&[("category", category)]);
        }

        let nodes = send("list nodes", request).await?;
        debug!(count = json_len(&nodes), "Retrieved nodes list");
        Ok(nodes)
    }

    /// Run a workflow to completion: `POST /run_workflow_sync/{uuid}`
    pub async fn run_workflow(&self, workflow_uuid: &str) -> Result<Value> {
        let http = self.http()?;
        let url = format!("{}/run_workflow_sync/{}", self.base_url, workflow_uuid);

        let result = send(&format!("run workflow {}", workflow_uuid), http.post(&url)).await?;
        debug!(workflow_uuid, result = %result, "Workflow execution result");
        Ok(result)
    }

    /// Run an assistant to completion: `POST /assistant/run_sync`
    pub async fn run_assistant(&self, request: &AssistantRequest) -> Result<Value> {
        let http = self.http()?;
        let url = format!("{}/assistant/run_sync", self.base_url);

        debug!(
            assistant_id = %request.assistant_id,
            message = %request.message,
            "Executing assistant"
        );

        let operation = format!("run assistant {}", request.assistant_id);
        let result = send(&operation, http.post(&url).json(request)).await?;
        debug!(assistant_id = %request.assistant_id, result = %result, "Assistant execution result");
        Ok(result)
    }

    /// Blocking `execute` on a private runtime and a private connection
    ///
    /// Leaves this client's own connection untouched. Fails without sending
    /// anything when called from within an async runtime.
    pub fn execute_blocking<P>(&self, class_path: &str, inputs: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        let operation = format!("execute node {}", class_path);

        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(log_failure(ClientError::transport(
                operation,
                "blocking call made from within an async runtime; use execute instead",
            )));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| log_failure(ClientError::transport(operation, e)))?;

        runtime.block_on(async {
            let connection = Connection::open(&self.stats, self.timeout).map_err(log_failure)?;
            self.execute_on(connection.http(), class_path, inputs).await
        })
    }

    async fn execute_on<P>(&self, http: &Client, class_path: &str, inputs: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        let url = format!("{}/nodes/execute/{}", self.base_url, class_path);

        if tracing::enabled!(tracing::Level::DEBUG) {
            let inputs = serde_json::to_string(inputs).unwrap_or_default();
            debug!(class_path, inputs = %inputs, "Executing node");
        }

        let operation = format!("execute node {}", class_path);
        let result = send(&operation, http.post(&url).json(inputs)).await?;
        debug!(class_path, result = %result, "Node execution result");
        Ok(result)
    }

    /// Handle to the current connection, opening one if needed
    fn http(&self) -> Result<Client> {
        let mut slot = self.slot();
        if let Some(connection) = slot.as_ref() {
            return Ok(connection.http().clone());
        }

        let connection = Connection::open(&self.stats, self.timeout).map_err(log_failure)?;
        let http = connection.http().clone();
        *slot = Some(connection);
        Ok(http)
    }

    fn slot(&self) -> MutexGuard<'_, Option<Connection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ToolsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connected", &self.has_connection())
            .finish()
    }
}

/// Keeps the client's connection open; closes it on drop
#[derive(Debug)]
pub struct ConnectionScope<'a> {
    client: &'a ToolsClient,
}

impl Deref for ConnectionScope<'_> {
    type Target = ToolsClient;

    fn deref(&self) -> &ToolsClient {
        self.client
    }
}

impl Drop for ConnectionScope<'_> {
    fn drop(&mut self) {
        self.client.close_connection();
    }
}

/// Send a request and decode the JSON body
///
/// Status is checked before the body is read, so an error status never
/// reaches the JSON decoder. An empty or whitespace-only body decodes to null.
async fn send(operation: &str, request: RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| log_failure(ClientError::transport(operation, e)))?;

    let body = response
        .bytes()
        .await
        .map_err(|e| log_failure(ClientError::transport(operation, e)))?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&body).map_err(|e| log_failure(ClientError::protocol(operation, e)))
}

fn log_failure(err: ClientError) -> ClientError {
    match &err {
        ClientError::Transport { operation, source } => {
            error!(code = err.code(), "HTTP error during {}: {}", operation, source);
        }
        ClientError::Protocol { operation, source } => {
            error!(code = err.code(), "Invalid response during {}: {}", operation, source);
        }
    }
    err
}

fn json_len(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 1,
    }
}
