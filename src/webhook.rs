//! Contract with the n8n chat workflow.
//!
//! The browser never talks to n8n directly: requests go through the
//! [`relay_chat_message`](crate::server_fn::webhook::relay_chat_message) server
//! function, which returns the raw status and body. Everything here is about
//! turning that raw reply into either the bot's text or a diagnostic.

use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

use crate::config::WebhookEndpoint;
use crate::server_fn::webhook::relay_chat_message;

pub const SEND_MESSAGE_ACTION: &str = "sendMessage";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub session_id: String,
    pub action: String,
    pub chat_input: String,
}

impl WebhookRequest {
    pub fn send_message(session_id: impl Into<String>, chat_input: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            action: SEND_MESSAGE_ACTION.to_string(),
            chat_input: chat_input.into(),
        }
    }
}

/// Raw HTTP reply from the workflow, before classification.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn into_reply(self) -> Result<String, WebhookError> {
        interpret(self.status, &self.body)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WebhookError {
    #[error("N8N workflow is not activated")]
    NotRegistered,

    #[error("N8N workflow execution failed")]
    WorkflowFailed,

    #[error("{0}")]
    Request(String),
}

impl WebhookError {
    /// Markdown shown in place of the bot reply.
    pub fn diagnostic(&self, request: &WebhookRequest, endpoint: &WebhookEndpoint) -> String {
        match self {
            WebhookError::NotRegistered => format!(
                "**⚠️ N8N Workflow Not Activated**\n\n\
                 Your N8N workflow needs to be activated!\n\n\
                 **To fix this:**\n\n\
                 1. Open N8N: **{base}**\n\
                 2. Find your workflow with webhook ID: `{id}`\n\
                 3. **Toggle the workflow to ACTIVE** (switch in top-right corner)\n\
                 4. Make sure the workflow is saved\n\
                 5. Wait a few seconds for N8N to register the webhook\n\
                 6. Try sending a message again\n\n\
                 **Note:** The workflow must be ACTIVE (green/ON) for production webhooks to work.",
                base = endpoint.base_url,
                id = endpoint.webhook_id(),
            ),
            WebhookError::WorkflowFailed => {
                let body = serde_json::to_string_pretty(request).unwrap_or_default();
                format!(
                    "**⚠️ N8N Workflow Execution Error**\n\n\
                     Good news: The webhook is working! But there's an error inside your N8N workflow.\n\n\
                     **To fix this:**\n\n\
                     1. Open N8N: **{base}**\n\
                     2. Go to **Executions** (left sidebar)\n\
                     3. Check the latest execution - it will show the error\n\
                     4. Common issues:\n   \
                     - Missing or incorrect node configuration\n   \
                     - Wrong data format expected\n   \
                     - Missing required fields\n   \
                     - Code errors in Code/Function nodes\n\n\
                     **Request sent:**\n\
                     ```json\n{body}\n```\n\n\
                     **Check N8N Executions tab for detailed error information.**",
                    base = endpoint.base_url,
                )
            }
            WebhookError::Request(message) => format!(
                "**Error:** {message}\n\n\
                 **Troubleshooting:**\n\n\
                 1. ✅ Is N8N running at {base}?\n\
                 2. ✅ Is the workflow **ACTIVATED** (toggle switch ON)?\n\
                 3. ✅ Does the webhook path match: `{path}`?\n\
                 4. ✅ Check N8N **Executions** tab for error details\n\n\
                 **Webhook URL:** {url}",
                base = endpoint.base_url,
                path = endpoint.path,
                url = endpoint.url(),
            ),
        }
    }
}

/// Something that can deliver a [`WebhookRequest`] and hand back the raw reply.
pub trait WebhookTransport {
    fn endpoint(&self) -> &WebhookEndpoint;

    fn send(
        &self,
        request: &WebhookRequest,
    ) -> impl Future<Output = Result<WebhookResponse, WebhookError>>;
}

/// Browser-side transport that goes through the server relay.
#[derive(Debug, Clone, Default)]
pub struct N8nWebhook {
    endpoint: WebhookEndpoint,
}

impl N8nWebhook {
    pub fn new(endpoint: WebhookEndpoint) -> Self {
        Self { endpoint }
    }
}

impl WebhookTransport for N8nWebhook {
    fn endpoint(&self) -> &WebhookEndpoint {
        &self.endpoint
    }

    async fn send(&self, request: &WebhookRequest) -> Result<WebhookResponse, WebhookError> {
        relay_chat_message(request.clone()).await.map_err(|e| {
            error!("Error calling N8N webhook: {e}");
            WebhookError::Request(e.to_string())
        })
    }
}

/// Classifies a raw webhook reply.
pub fn interpret(status: u16, body: &str) -> Result<String, WebhookError> {
    let ok = (200..300).contains(&status);

    let data: Value = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(_) if !ok => return Err(WebhookError::Request(format!("HTTP error! status: {status}"))),
        Err(_) => return Err(WebhookError::Request("Invalid response from server".to_string())),
    };

    let error_code = data.get("code").and_then(Value::as_f64);
    if !ok || error_code.is_some_and(|code| code == 404.0 || code == 500.0) {
        let message = ["message", "error"]
            .iter()
            .find_map(|key| data.get(*key).filter(|v| is_truthy(v)).map(value_text))
            .unwrap_or_else(|| format!("HTTP error! status: {status}"));
        return Err(classify(&message, status));
    }

    Ok(extract_reply(&data))
}

fn classify(message: &str, status: u16) -> WebhookError {
    if message.contains("not registered") || message.contains("The requested webhook") {
        WebhookError::NotRegistered
    } else if message.contains("Error in workflow") || status == 500 {
        WebhookError::WorkflowFailed
    } else {
        WebhookError::Request(message.to_string())
    }
}

/// Picks the reply text out of a successful body.
///
/// Priority: a bare JSON string, then `output`, `response`, `message` (only
/// when the body carries no `code`), `text`, and finally the whole body
/// serialized.
pub fn extract_reply(data: &Value) -> String {
    if let Value::String(text) = data {
        return text.clone();
    }

    let has_code = data.get("code").is_some_and(is_truthy);
    let field = |key: &str| data.get(key).filter(|v| is_truthy(v)).map(value_text);

    field("output")
        .or_else(|| field("response"))
        .or_else(|| if has_code { None } else { field("message") })
        .or_else(|| field("text"))
        .unwrap_or_else(|| data.to_string())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_uses_camel_case() {
        let request = WebhookRequest::send_message("s-1", "Hello");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({"sessionId": "s-1", "action": "sendMessage", "chatInput": "Hello"})
        );
    }

    #[test]
    fn test_output_wins() {
        let reply = interpret(200, r#"{"output":"Hi there","response":"no","text":"no"}"#);
        assert_eq!(reply, Ok("Hi there".to_string()));
    }

    #[test]
    fn test_reply_priority_chain() {
        assert_eq!(extract_reply(&json!({"response": "r", "text": "t"})), "r");
        assert_eq!(extract_reply(&json!({"message": "m", "text": "t"})), "m");
        assert_eq!(extract_reply(&json!({"text": "t"})), "t");
        assert_eq!(extract_reply(&json!("plain")), "plain");
    }

    #[test]
    fn test_message_skipped_when_code_present() {
        assert_eq!(extract_reply(&json!({"code": 200, "message": "m", "text": "t"})), "t");
    }

    #[test]
    fn test_empty_fields_fall_through() {
        assert_eq!(extract_reply(&json!({"output": "", "text": "t"})), "t");
    }

    #[test]
    fn test_unknown_shape_is_serialized() {
        let reply = interpret(200, r#"[{"output":"nested"}]"#).unwrap();
        assert_eq!(reply, r#"[{"output":"nested"}]"#);
    }

    #[test]
    fn test_not_registered() {
        let body = r#"{"code":404,"message":"The requested webhook \"POST abc\" is not registered."}"#;
        assert_eq!(interpret(404, body), Err(WebhookError::NotRegistered));
        // the code alone marks an error even with a 200 status
        assert_eq!(interpret(200, body), Err(WebhookError::NotRegistered));
    }

    #[test]
    fn test_float_error_codes_count() {
        let body = r#"{"code":404.0,"message":"The requested webhook \"POST abc\" is not registered."}"#;
        assert_eq!(interpret(200, body), Err(WebhookError::NotRegistered));
        assert_eq!(
            interpret(200, r#"{"code":500.0,"message":"Error in workflow"}"#),
            Err(WebhookError::WorkflowFailed)
        );
        assert_eq!(interpret(200, r#"{"code":200.0,"output":"fine"}"#), Ok("fine".to_string()));
    }

    #[test]
    fn test_workflow_error() {
        let body = r#"{"message":"Error in workflow node X"}"#;
        assert_eq!(interpret(500, body), Err(WebhookError::WorkflowFailed));
        assert_eq!(interpret(500, r#"{"message":"boom"}"#), Err(WebhookError::WorkflowFailed));
    }

    #[test]
    fn test_generic_errors() {
        assert_eq!(
            interpret(403, r#"{"error":"forbidden"}"#),
            Err(WebhookError::Request("forbidden".to_string()))
        );
        assert_eq!(
            interpret(502, "<html>bad gateway</html>"),
            Err(WebhookError::Request("HTTP error! status: 502".to_string()))
        );
        assert_eq!(
            interpret(200, "not json"),
            Err(WebhookError::Request("Invalid response from server".to_string()))
        );
        assert_eq!(
            interpret(418, "{}"),
            Err(WebhookError::Request("HTTP error! status: 418".to_string()))
        );
    }

    #[test]
    fn test_diagnostics_are_distinct() {
        let request = WebhookRequest::send_message("s-1", "Hello");
        let endpoint = WebhookEndpoint::default();

        let not_registered = WebhookError::NotRegistered.diagnostic(&request, &endpoint);
        assert!(not_registered.contains("Not Activated"));
        assert!(not_registered.contains(endpoint.webhook_id()));

        let workflow = WebhookError::WorkflowFailed.diagnostic(&request, &endpoint);
        assert!(workflow.contains("Execution Error"));
        assert!(workflow.contains("\"chatInput\": \"Hello\""));

        let generic = WebhookError::Request("Failed to fetch".to_string()).diagnostic(&request, &endpoint);
        assert!(generic.starts_with("**Error:** Failed to fetch"));
        assert!(generic.contains(&endpoint.url()));
    }
}
