//! Gateway to the `conversations` and `messages` tables.
//!
//! Every operation hands back either the value or a failure sentinel (`None` /
//! `false`) and logs the cause; deciding what a failure means is left to the
//! caller.

use log::error;
use std::future::Future;

use crate::models::conversations::{Conversation, Message, Role};
use crate::server_fn::conversations::{
    fetch_conversation, fetch_conversations, fetch_messages, insert_conversation,
    insert_message, remove_conversation, rename_conversation,
};

pub trait ConversationStore {
    fn create_conversation(
        &self,
        session_id: &str,
        title: &str,
    ) -> impl Future<Output = Option<Conversation>>;

    /// Conversations of a session, most recently updated first.
    fn list_conversations(&self, session_id: &str) -> impl Future<Output = Option<Vec<Conversation>>>;

    fn get_conversation(&self, conversation_id: &str) -> impl Future<Output = Option<Conversation>>;

    fn update_conversation_title(
        &self,
        conversation_id: &str,
        title: &str,
    ) -> impl Future<Output = bool>;

    /// Removes the conversation's messages, then the conversation itself.
    fn delete_conversation(&self, conversation_id: &str) -> impl Future<Output = bool>;

    fn add_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> impl Future<Output = Option<Message>>;

    /// Messages of a conversation, oldest first.
    fn list_messages(&self, conversation_id: &str) -> impl Future<Output = Option<Vec<Message>>>;
}

/// Store backed by Supabase through the `/api` server functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupabaseStore;

impl ConversationStore for SupabaseStore {
    async fn create_conversation(&self, session_id: &str, title: &str) -> Option<Conversation> {
        insert_conversation(session_id.to_string(), title.to_string())
            .await
            .map_err(|e| error!("Error creating conversation: {e}"))
            .ok()
    }

    async fn list_conversations(&self, session_id: &str) -> Option<Vec<Conversation>> {
        fetch_conversations(session_id.to_string())
            .await
            .map_err(|e| error!("Error fetching conversations: {e}"))
            .ok()
    }

    async fn get_conversation(&self, conversation_id: &str) -> Option<Conversation> {
        fetch_conversation(conversation_id.to_string())
            .await
            .map_err(|e| error!("Error fetching conversation {conversation_id}: {e}"))
            .ok()
    }

    async fn update_conversation_title(&self, conversation_id: &str, title: &str) -> bool {
        rename_conversation(conversation_id.to_string(), title.to_string())
            .await
            .map_err(|e| error!("Error updating conversation {conversation_id}: {e}"))
            .is_ok()
    }

    async fn delete_conversation(&self, conversation_id: &str) -> bool {
        remove_conversation(conversation_id.to_string())
            .await
            .map_err(|e| error!("Error deleting conversation {conversation_id}: {e}"))
            .is_ok()
    }

    async fn add_message(&self, conversation_id: &str, role: Role, content: &str) -> Option<Message> {
        insert_message(conversation_id.to_string(), role, content.to_string())
            .await
            .map_err(|e| error!("Error adding {role} message to {conversation_id}: {e}"))
            .ok()
    }

    async fn list_messages(&self, conversation_id: &str) -> Option<Vec<Message>> {
        fetch_messages(conversation_id.to_string())
            .await
            .map_err(|e| error!("Error fetching messages for {conversation_id}: {e}"))
            .ok()
    }
}
