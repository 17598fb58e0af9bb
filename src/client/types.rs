// Request bodies with a fixed shape

use serde::Serialize;
use serde_json::Value;

/// Body of `POST /assistant/run_sync`
///
/// Optional fields are sent as explicit `null`, never omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantRequest {
    pub assistant_id: String,
    pub message: String,
    pub session_id: Option<String>,
    pub message_type: Option<String>,
    pub metadata: Option<Value>,
}

impl AssistantRequest {
    pub fn new(assistant_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            message: message.into(),
            session_id: None,
            message_type: None,
            metadata: None,
        }
    }

    /// Continue an existing conversation
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_serialize_as_null() {
        let body = serde_json::to_value(AssistantRequest::new("asst-1", "hello")).unwrap();
        assert_eq!(
            body,
            json!({
                "assistant_id": "asst-1",
                "message": "hello",
                "session_id": null,
                "message_type": null,
                "metadata": null
            })
        );
    }

    #[test]
    fn test_builder_sets_optional_fields() {
        let request = AssistantRequest::new("asst-1", "hello")
            .session_id("test_session")
            .message_type("text")
            .metadata(json!({"source": "cli"}));

        assert_eq!(request.session_id.as_deref(), Some("test_session"));
        assert_eq!(request.message_type.as_deref(), Some("text"));
        assert_eq!(request.metadata, Some(json!({"source": "cli"})));
    }
}
