use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Title used by conversations that were created before any message was sent.
pub const PLACEHOLDER_TITLE_PREFIX: &str = "New Chat";

/// Text shown in the bot bubble while the webhook call is in flight.
pub const LOADING_TEXT: &str = "...";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub session_id: String,
    pub title: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Timestamp used for ordering and for the sidebar date label.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

// insert type for the conversations table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewConversation {
    pub session_id: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

// insert type for the messages table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
}

/// In-memory message as the chat view renders it.
///
/// Unlike [`Message`], a view message can be a loading placeholder or a reply
/// whose text is still being revealed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ViewMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub loading: bool,
    pub streaming: bool,
}

impl ViewMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4()),
            role: Role::User,
            text: text.into(),
            loading: false,
            streaming: false,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            id: format!("bot-{}", Uuid::new_v4()),
            role: Role::Bot,
            text: LOADING_TEXT.to_string(),
            loading: true,
            streaming: false,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

impl From<Message> for ViewMessage {
    fn from(message: Message) -> Self {
        ViewMessage {
            id: message.id,
            role: message.role,
            text: message.content,
            loading: false,
            streaming: false,
        }
    }
}

/// One row of the conversation sidebar.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatHistoryItem {
    pub id: String,
    pub title: String,
    pub date: String,
    pub active: bool,
}

impl ChatHistoryItem {
    pub fn from_conversation(
        conversation: &Conversation,
        active_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        ChatHistoryItem {
            id: conversation.id.clone(),
            title: conversation.title.clone(),
            date: relative_date_label(conversation.last_activity(), now),
            active: active_id == Some(conversation.id.as_str()),
        }
    }
}

pub fn relative_date_label(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(timestamp) = timestamp else {
        return "Unknown".to_string();
    };

    // clock skew can put fresh rows slightly in the future
    let days = (now - timestamp).num_days().max(0);

    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        7..=29 => format!("{} weeks ago", days / 7),
        _ => timestamp.format("%-m/%-d/%Y").to_string(),
    }
}

/// Orders conversations most recently active first.
pub fn sort_by_activity(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn conversation(id: &str, updated_at: Option<DateTime<Utc>>) -> Conversation {
        Conversation {
            id: id.to_string(),
            session_id: "session".to_string(),
            title: format!("title {id}"),
            created_at: Some(now() - Duration::days(90)),
            updated_at,
        }
    }

    #[test]
    fn test_relative_date_labels() {
        assert_eq!(relative_date_label(None, now()), "Unknown");
        assert_eq!(relative_date_label(Some(now() - Duration::hours(3)), now()), "Today");
        assert_eq!(relative_date_label(Some(now() - Duration::hours(30)), now()), "Yesterday");
        assert_eq!(relative_date_label(Some(now() - Duration::days(4)), now()), "4 days ago");
        assert_eq!(relative_date_label(Some(now() - Duration::days(15)), now()), "2 weeks ago");
        assert_eq!(relative_date_label(Some(now() - Duration::days(45)), now()), "2/3/2025");
    }

    #[test]
    fn test_future_timestamp_is_today() {
        assert_eq!(relative_date_label(Some(now() + Duration::minutes(5)), now()), "Today");
    }

    #[test]
    fn test_history_item_marks_active_conversation() {
        let conv = conversation("abc", Some(now()));
        let active = ChatHistoryItem::from_conversation(&conv, Some("abc"), now());
        let inactive = ChatHistoryItem::from_conversation(&conv, Some("other"), now());
        assert!(active.active);
        assert!(!inactive.active);
        assert_eq!(active.date, "Today");
    }

    #[test]
    fn test_sort_by_activity_falls_back_to_created_at() {
        let mut convs = vec![
            conversation("old", None),
            conversation("new", Some(now())),
            conversation("mid", Some(now() - Duration::days(2))),
        ];
        sort_by_activity(&mut convs);
        let ids: Vec<&str> = convs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Bot).unwrap(), "\"bot\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
