use leptos::prelude::*;

use crate::models::conversations::{Conversation, Message, Role};

#[server(InsertConversation, "/api")]
pub async fn insert_conversation(session_id: String, title: String) -> Result<Conversation, ServerFnError> {
    ssr::insert_conversation(session_id, title)
        .await
        .map_err(ssr::to_server_error)
}

#[server(FetchConversations, "/api")]
pub async fn fetch_conversations(session_id: String) -> Result<Vec<Conversation>, ServerFnError> {
    ssr::fetch_conversations(&session_id)
        .await
        .map_err(ssr::to_server_error)
}

#[server(FetchConversation, "/api")]
pub async fn fetch_conversation(conversation_id: String) -> Result<Conversation, ServerFnError> {
    ssr::fetch_conversation(&conversation_id)
        .await
        .map_err(ssr::to_server_error)
}

#[server(RenameConversation, "/api")]
pub async fn rename_conversation(conversation_id: String, title: String) -> Result<(), ServerFnError> {
    ssr::rename_conversation(&conversation_id, title)
        .await
        .map_err(ssr::to_server_error)
}

#[server(RemoveConversation, "/api")]
pub async fn remove_conversation(conversation_id: String) -> Result<(), ServerFnError> {
    ssr::remove_conversation(&conversation_id)
        .await
        .map_err(ssr::to_server_error)
}

#[server(InsertMessage, "/api")]
pub async fn insert_message(
    conversation_id: String,
    role: Role,
    content: String,
) -> Result<Message, ServerFnError> {
    ssr::insert_message(conversation_id, role, content)
        .await
        .map_err(ssr::to_server_error)
}

#[server(FetchMessages, "/api")]
pub async fn fetch_messages(conversation_id: String) -> Result<Vec<Message>, ServerFnError> {
    ssr::fetch_messages(&conversation_id)
        .await
        .map_err(ssr::to_server_error)
}

#[cfg(feature = "ssr")]
mod ssr {
    use chrono::Utc;
    use leptos::prelude::ServerFnError;
    use log::{debug, warn};
    use postgrest::Builder;
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use thiserror::Error;

    use crate::config::ConfigError;
    use crate::models::conversations::{
        Conversation, Message, NewConversation, NewMessage, Role,
    };
    use crate::supabase::get_client;

    const CONVERSATIONS: &str = "conversations";
    const MESSAGES: &str = "messages";

    #[derive(Error, Debug)]
    pub enum StoreError {
        #[error("supabase config error: {0}")]
        Config(#[from] ConfigError),

        #[error("supabase request error: {0}")]
        Request(String),

        #[error("supabase returned {status}: {body}")]
        Status { status: u16, body: String },

        #[error("JSON parse error: {0}")]
        Parse(#[from] serde_json::Error),

        #[error("{0} not found")]
        NotFound(String),
    }

    pub fn to_server_error(e: StoreError) -> ServerFnError {
        ServerFnError::ServerError(e.to_string())
    }

    async fn execute(request: Builder) -> Result<String, StoreError> {
        let response = request
            .execute()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn rows<T: DeserializeOwned>(request: Builder) -> Result<Vec<T>, StoreError> {
        let body = execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn first_row<T: DeserializeOwned>(request: Builder, what: &str) -> Result<T, StoreError> {
        rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(what.to_string()))
    }

    pub async fn insert_conversation(session_id: String, title: String) -> Result<Conversation, StoreError> {
        let body = serde_json::to_string(&NewConversation { session_id, title })?;
        let request = get_client()?.from(CONVERSATIONS).insert(body);
        let conversation: Conversation = first_row(request, "created conversation").await?;
        debug!("created conversation {}", conversation.id);
        Ok(conversation)
    }

    pub async fn fetch_conversations(session_id: &str) -> Result<Vec<Conversation>, StoreError> {
        let request = get_client()?
            .from(CONVERSATIONS)
            .select("*")
            .eq("session_id", session_id)
            .order("updated_at.desc");
        rows(request).await
    }

    pub async fn fetch_conversation(conversation_id: &str) -> Result<Conversation, StoreError> {
        let request = get_client()?
            .from(CONVERSATIONS)
            .select("*")
            .eq("id", conversation_id);
        first_row(request, &format!("conversation {conversation_id}")).await
    }

    pub async fn rename_conversation(conversation_id: &str, title: String) -> Result<(), StoreError> {
        let body = json!({ "title": title, "updated_at": Utc::now() }).to_string();
        let request = get_client()?
            .from(CONVERSATIONS)
            .eq("id", conversation_id)
            .update(body);
        execute(request).await.map(|_| ())
    }

    pub async fn remove_conversation(conversation_id: &str) -> Result<(), StoreError> {
        let client = get_client()?;

        execute(
            client
                .from(MESSAGES)
                .eq("conversation_id", conversation_id)
                .delete(),
        )
        .await?;

        execute(client.from(CONVERSATIONS).eq("id", conversation_id).delete()).await?;
        debug!("deleted conversation {conversation_id}");
        Ok(())
    }

    pub async fn insert_message(
        conversation_id: String,
        role: Role,
        content: String,
    ) -> Result<Message, StoreError> {
        let client = get_client()?;
        let body = serde_json::to_string(&NewMessage {
            conversation_id: conversation_id.clone(),
            role,
            content,
        })?;
        let message: Message = first_row(client.from(MESSAGES).insert(body), "created message").await?;

        // keeps the sidebar ordered by activity
        let touch = json!({ "updated_at": Utc::now() }).to_string();
        if let Err(e) = execute(client.from(CONVERSATIONS).eq("id", &conversation_id).update(touch)).await {
            warn!("failed to bump updated_at of {conversation_id}: {e}");
        }

        Ok(message)
    }

    pub async fn fetch_messages(conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        let request = get_client()?
            .from(MESSAGES)
            .select("*")
            .eq("conversation_id", conversation_id)
            .order("created_at.asc");
        rows(request).await
    }
}
