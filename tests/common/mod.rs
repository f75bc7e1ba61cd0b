#![allow(dead_code)]

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use easygpt::chat_session::ChatSession;
use easygpt::config::{RevealConfig, WebhookEndpoint};
use easygpt::identity::{MemoryStorage, SessionIdentity};
use easygpt::models::conversations::{Conversation, Message, Role};
use easygpt::store::ConversationStore;
use easygpt::streaming::FrameScheduler;
use easygpt::webhook::{WebhookError, WebhookRequest, WebhookResponse, WebhookTransport};

pub type TestSession = ChatSession<FakeStore, FakeWebhook, ImmediateScheduler, MemoryStorage>;

pub fn session() -> TestSession {
    session_with(FakeStore::default(), FakeWebhook::default())
}

pub fn session_with(store: FakeStore, webhook: FakeWebhook) -> TestSession {
    let identity = SessionIdentity::init(MemoryStorage::new());
    ChatSession::new(store, webhook, ImmediateScheduler::default(), identity).with_reveal(RevealConfig {
        chars_per_tick: 3,
        frame_delay: Duration::ZERO,
    })
}

pub fn output(text: &str) -> WebhookResponse {
    WebhookResponse {
        status: 200,
        body: serde_json::json!({ "output": text }).to_string(),
    }
}

/// In-memory conversation store with a deterministic clock and failure switches.
#[derive(Default)]
pub struct FakeStore {
    pub conversations: RefCell<Vec<Conversation>>,
    pub messages: RefCell<Vec<Message>>,
    pub fail_create: Cell<bool>,
    pub fail_list_conversations: Cell<bool>,
    pub fail_list_messages: Cell<bool>,
    pub fail_delete: Cell<bool>,
    pub list_messages_calls: Cell<usize>,
    pub title_updates: RefCell<Vec<(String, String)>>,
    next_id: Cell<u32>,
    clock: Cell<i64>,
}

impl FakeStore {
    fn tick(&self) -> DateTime<Utc> {
        let seconds = self.clock.get() + 1;
        self.clock.set(seconds);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().unwrap_or_default();
        base + ChronoDuration::seconds(seconds)
    }

    fn next_id(&self, prefix: &str) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("{prefix}-{id}")
    }

    /// Inserts a conversation with the given messages, bypassing the session.
    pub fn seed(&self, session_id: &str, title: &str, contents: &[(Role, &str)]) -> String {
        let now = self.tick();
        let id = self.next_id("conv");
        self.conversations.borrow_mut().push(Conversation {
            id: id.clone(),
            session_id: session_id.to_string(),
            title: title.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        });
        for (role, content) in contents {
            let created_at = self.tick();
            let message_id = self.next_id("msg");
            self.messages.borrow_mut().push(Message {
                id: message_id,
                conversation_id: id.clone(),
                role: *role,
                content: content.to_string(),
                created_at: Some(created_at),
            });
        }
        id
    }

    pub fn messages_of(&self, conversation_id: &str) -> Vec<(Role, String)> {
        self.messages
            .borrow()
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    pub fn title_of(&self, conversation_id: &str) -> Option<String> {
        self.conversations
            .borrow()
            .iter()
            .find(|c| c.id == conversation_id)
            .map(|c| c.title.clone())
    }
}

impl ConversationStore for FakeStore {
    async fn create_conversation(&self, session_id: &str, title: &str) -> Option<Conversation> {
        if self.fail_create.get() {
            return None;
        }
        let now = self.tick();
        let conversation = Conversation {
            id: self.next_id("conv"),
            session_id: session_id.to_string(),
            title: title.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.conversations.borrow_mut().push(conversation.clone());
        Some(conversation)
    }

    async fn list_conversations(&self, session_id: &str) -> Option<Vec<Conversation>> {
        if self.fail_list_conversations.get() {
            return None;
        }
        Some(
            self.conversations
                .borrow()
                .iter()
                .filter(|c| c.session_id == session_id)
                .cloned()
                .collect(),
        )
    }

    async fn get_conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.conversations
            .borrow()
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
    }

    async fn update_conversation_title(&self, conversation_id: &str, title: &str) -> bool {
        let now = self.tick();
        let mut conversations = self.conversations.borrow_mut();
        let Some(conversation) = conversations.iter_mut().find(|c| c.id == conversation_id) else {
            return false;
        };
        conversation.title = title.to_string();
        conversation.updated_at = Some(now);
        self.title_updates
            .borrow_mut()
            .push((conversation_id.to_string(), title.to_string()));
        true
    }

    async fn delete_conversation(&self, conversation_id: &str) -> bool {
        if self.fail_delete.get() {
            return false;
        }
        self.messages
            .borrow_mut()
            .retain(|m| m.conversation_id != conversation_id);
        self.conversations.borrow_mut().retain(|c| c.id != conversation_id);
        true
    }

    async fn add_message(&self, conversation_id: &str, role: Role, content: &str) -> Option<Message> {
        let now = self.tick();
        let message = Message {
            id: self.next_id("msg"),
            conversation_id: conversation_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Some(now),
        };
        self.messages.borrow_mut().push(message.clone());
        if let Some(conversation) = self
            .conversations
            .borrow_mut()
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            conversation.updated_at = Some(now);
        }
        Some(message)
    }

    async fn list_messages(&self, conversation_id: &str) -> Option<Vec<Message>> {
        self.list_messages_calls.set(self.list_messages_calls.get() + 1);
        if self.fail_list_messages.get() {
            return None;
        }
        Some(
            self.messages
                .borrow()
                .iter()
                .filter(|m| m.conversation_id == conversation_id)
                .cloned()
                .collect(),
        )
    }
}

/// Scripted webhook. Replies are served in order; when none are queued the
/// reply is `{"output":"ok"}`. An armed gate holds the next call until released.
#[derive(Default)]
pub struct FakeWebhook {
    endpoint: WebhookEndpoint,
    replies: RefCell<VecDeque<Result<WebhookResponse, WebhookError>>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    pub calls: RefCell<Vec<WebhookRequest>>,
}

impl FakeWebhook {
    pub fn reply(self, response: WebhookResponse) -> Self {
        self.replies.borrow_mut().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: WebhookError) -> Self {
        self.replies.borrow_mut().push_back(Err(error));
        self
    }

    /// Blocks the next call until the returned sender fires.
    pub fn arm_gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl WebhookTransport for FakeWebhook {
    fn endpoint(&self) -> &WebhookEndpoint {
        &self.endpoint
    }

    async fn send(&self, request: &WebhookRequest) -> Result<WebhookResponse, WebhookError> {
        self.calls.borrow_mut().push(request.clone());
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(output("ok")))
    }
}

/// Frame scheduler that never waits unless a gate is armed.
#[derive(Default)]
pub struct ImmediateScheduler {
    pub frames: Cell<usize>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl ImmediateScheduler {
    /// Holds the next frame until the returned sender fires.
    pub fn arm_gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }
}

impl FrameScheduler for ImmediateScheduler {
    async fn next_frame(&self, _delay: Duration) {
        self.frames.set(self.frames.get() + 1);
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}
