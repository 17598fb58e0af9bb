// autotask - command line front end for the automation API
// Main entry point

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use autotask_client::config::{load_config, ClientConfig};
use autotask_client::errors::connection_refused_hint;
use autotask_client::{AssistantRequest, ClientError, ToolsClient};
use tracing_subscriber::prelude::*;

/// Node used by the smoke run
const FILE_LIST_NODE: &str = "autotask_core.nodes.file.FileListNode";

#[derive(Parser, Debug)]
#[command(name = "autotask")]
#[command(about = "Client for the automation API (nodes, workflows, assistants)", version)]
struct Args {
    /// API base address (overrides config file and AUTOTASK_BASE_URL)
    #[arg(long = "base-url", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a node's metadata
    NodeInfo {
        /// Node class path, e.g. autotask_core.nodes.file.FileListNode
        class_path: String,
    },
    /// List available nodes
    ListNodes {
        /// Only list nodes in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Execute a node
    RunNode {
        class_path: String,
        /// Inputs as a JSON object
        #[arg(long)]
        inputs: Option<String>,
        /// Single string input as key=value (repeatable, applied after --inputs)
        #[arg(long = "input", value_name = "KEY=VALUE")]
        input: Vec<String>,
    },
    /// Run a workflow synchronously
    RunWorkflow {
        /// Workflow UUID
        uuid: String,
    },
    /// Run an assistant synchronously
    RunAssistant {
        assistant_id: String,
        message: String,
        #[arg(long = "session-id")]
        session_id: Option<String>,
        #[arg(long = "message-type")]
        message_type: Option<String>,
        /// Metadata as a JSON value
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Fetch node info, list nodes, then run FileListNode
    Smoke,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let mut config = load_config()?.client;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    let client = ToolsClient::from_config(&config);
    let scoped = client.scope()?;

    let outcome = match args.command {
        Command::NodeInfo { class_path } => scoped.describe(&class_path).await.map(print_json),
        Command::ListNodes { category } => scoped.list(category.as_deref()).await.map(print_json),
        Command::RunNode {
            class_path,
            inputs,
            input,
        } => {
            let inputs = parse_inputs(inputs.as_deref(), &input)?;
            scoped.execute(&class_path, &inputs).await.map(print_json)
        }
        Command::RunWorkflow { uuid } => scoped.run_workflow(&uuid).await.map(print_json),
        Command::RunAssistant {
            assistant_id,
            message,
            session_id,
            message_type,
            metadata,
        } => {
            let request = build_assistant_request(
                assistant_id,
                message,
                session_id,
                message_type,
                metadata.as_deref(),
            )?;
            scoped.run_assistant(&request).await.map(print_json)
        }
        Command::Smoke => run_smoke(&scoped).await,
    };

    outcome.map_err(|e| explain(e, &config))
}

/// Run the node info, node list and file list checks in order
async fn run_smoke(client: &ToolsClient) -> autotask_client::Result<()> {
    println!("\n=== Node information ===");
    print_json(client.describe(FILE_LIST_NODE).await?);

    println!("\n=== Available nodes ===");
    print_json(client.list(None).await?);

    println!("\n=== File list ===");
    let inputs = json!({
        "directory": "",
        "pattern": "",
        "include_dirs": "true",
        "recursive": "false"
    });
    print_json(client.execute(FILE_LIST_NODE, &inputs).await?);

    Ok(())
}

/// Merge `--inputs` JSON with `--input key=value` pairs
fn parse_inputs(inputs: Option<&str>, pairs: &[String]) -> Result<Value> {
    let mut map = match inputs {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("--inputs is not valid JSON")? {
            Value::Object(map) => map,
            other => bail!("--inputs must be a JSON object, got: {}", other),
        },
        None => Map::new(),
    };

    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("--input expects KEY=VALUE, got: {}", pair))?;
        map.insert(key.to_string(), Value::String(value.to_string()));
    }

    Ok(Value::Object(map))
}

fn build_assistant_request(
    assistant_id: String,
    message: String,
    session_id: Option<String>,
    message_type: Option<String>,
    metadata: Option<&str>,
) -> Result<AssistantRequest> {
    let mut request = AssistantRequest::new(assistant_id, message);
    request.session_id = session_id;
    request.message_type = message_type;
    if let Some(raw) = metadata {
        let metadata = serde_json::from_str(raw).context("--metadata is not valid JSON")?;
        request = request.metadata(metadata);
    }
    Ok(request)
}

fn print_json(value: Value) {
    match serde_json::to_string_pretty(&value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

/// Attach a hint for unreachable servers
fn explain(err: ClientError, config: &ClientConfig) -> anyhow::Error {
    if err.is_connect() {
        let hint = connection_refused_hint(&config.base_url);
        return anyhow::Error::new(err).context(hint);
    }
    anyhow::Error::new(err)
}

/// Initialize tracing to stderr
///
/// Default level is WARN so JSON on stdout stays clean. RUST_LOG overrides it;
/// AUTOTASK_DEBUG=1 switches to DEBUG.
fn init_tracing() {
    let show_debug = std::env::var("AUTOTASK_DEBUG")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);

    let default_level = if show_debug { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    // Bridge log crate → tracing (for dependencies using log crate)
    tracing_log::LogTracer::init().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inputs_merges_pairs() {
        let pairs = vec!["recursive=false".to_string(), "pattern=*.rs".to_string()];
        let inputs = parse_inputs(Some(r#"{"directory": "/tmp", "recursive": true}"#), &pairs).unwrap();

        assert_eq!(
            inputs,
            json!({"directory": "/tmp", "recursive": "false", "pattern": "*.rs"})
        );
    }

    #[test]
    fn test_parse_inputs_defaults_to_empty_object() {
        assert_eq!(parse_inputs(None, &[]).unwrap(), json!({}));
    }

    #[test]
    fn test_parse_inputs_rejects_bad_values() {
        assert!(parse_inputs(Some("[1, 2]"), &[]).is_err());
        assert!(parse_inputs(Some("{"), &[]).is_err());
        assert!(parse_inputs(None, &["novalue".to_string()]).is_err());
    }

    #[test]
    fn test_assistant_request_from_args() {
        let request = build_assistant_request(
            "asst".to_string(),
            "hi".to_string(),
            Some("test_session".to_string()),
            None,
            Some(r#"{"k": 1}"#),
        )
        .unwrap();

        assert_eq!(request.session_id.as_deref(), Some("test_session"));
        assert_eq!(request.message_type, None);
        assert_eq!(request.metadata, Some(json!({"k": 1})));
    }
}
