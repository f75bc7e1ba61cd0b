use leptos::prelude::*;

use crate::config::WebhookEndpoint;
use crate::webhook::{WebhookRequest, WebhookResponse};

/// Forwards a chat message to the n8n workflow and returns its raw reply.
///
/// Non-2xx replies are returned as data, not as errors; only a failure to
/// reach n8n at all is an `Err`.
#[server(RelayChatMessage, "/api")]
pub async fn relay_chat_message(request: WebhookRequest) -> Result<WebhookResponse, ServerFnError> {
    use log::{debug, error};

    use crate::state::AppState;

    let app_state = use_context::<AppState>()
        .ok_or_else(|| ServerFnError::new("failed to get AppState from context"))?;

    let url = app_state.config.webhook.url();
    debug!("relaying message for session {} to {url}", request.session_id);

    let response = app_state
        .http
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(|e| -> ServerFnError {
            error!("N8N webhook request failed: {e}");
            ServerFnError::ServerError(format!("Failed to reach N8N at {url}"))
        })?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| -> ServerFnError {
        error!("Failed to read N8N response: {e}");
        ServerFnError::ServerError("Failed to read N8N response".to_string())
    })?;

    debug!("N8N responded with status {status}");
    Ok(WebhookResponse { status, body })
}

#[server(GetWebhookEndpoint, "/api")]
pub async fn webhook_endpoint() -> Result<WebhookEndpoint, ServerFnError> {
    use crate::state::AppState;

    let app_state = use_context::<AppState>()
        .ok_or_else(|| ServerFnError::new("failed to get AppState from context"))?;

    Ok(app_state.config.webhook.clone())
}
