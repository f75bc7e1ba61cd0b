//! Chat session state machine: optimistic send, reply reveal and
//! conversation switching.
//!
//! [`ChatSession`] is single-threaded and cooperative. All methods take
//! `&self`; state lives behind `RefCell`/`Cell` and no borrow is held across
//! an `.await`, so several operations may interleave on one event loop (a
//! switch while a send is waiting on the webhook, for instance).

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::cell::{Cell, RefCell};
use thiserror::Error;

use crate::config::RevealConfig;
use crate::identity::{KeyValueStorage, SessionIdentity};
use crate::models::conversations::{
    sort_by_activity, ChatHistoryItem, Conversation, Role, ViewMessage, PLACEHOLDER_TITLE_PREFIX,
};
use crate::store::ConversationStore;
use crate::streaming::{FrameScheduler, Reveal};
use crate::webhook::{WebhookError, WebhookRequest, WebhookTransport};

pub const TITLE_MAX_CHARS: usize = 50;
pub const TITLE_ELLIPSIS: &str = "...";

/// Title for a conversation started by `message`.
pub fn derive_title(message: &str) -> String {
    if message.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = message.chars().take(TITLE_MAX_CHARS).collect();
        format!("{truncated}{TITLE_ELLIPSIS}")
    } else {
        message.to_string()
    }
}

/// Whether a stored title should be replaced by the first user message.
pub fn should_upgrade_title(current_title: &str, message: &str) -> bool {
    message.chars().count() <= TITLE_MAX_CHARS
        && current_title != message
        && (current_title.starts_with(PLACEHOLDER_TITLE_PREFIX)
            || current_title.chars().count() > TITLE_MAX_CHARS)
}

/// Everything the chat view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub messages: Vec<ViewMessage>,
    pub conversation_id: Option<String>,
    pub conversations: Vec<Conversation>,
    pub is_sending: bool,
}

impl SessionState {
    pub fn history(&self, now: DateTime<Utc>) -> Vec<ChatHistoryItem> {
        let active = self.conversation_id.as_deref();
        self.conversations
            .iter()
            .map(|conversation| ChatHistoryItem::from_conversation(conversation, active, now))
            .collect()
    }

    fn message_mut(&mut self, id: &str) -> Option<&mut ViewMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Bubble that carries a reply. Reloading the conversation drops the
    /// placeholder; the reply is then appended unless the reloaded history
    /// already ends with it.
    fn reply_slot(&mut self, id: &str, reply: &str) -> Option<&mut ViewMessage> {
        if self.messages.iter().any(|m| m.id == id) {
            return self.message_mut(id);
        }
        if self
            .messages
            .last()
            .is_some_and(|m| !m.is_user() && m.text == reply)
        {
            return None;
        }
        self.messages.push(ViewMessage {
            id: id.to_string(),
            role: Role::Bot,
            text: String::new(),
            loading: false,
            streaming: false,
        });
        self.messages.last_mut()
    }
}

/// A persisted reply waiting to be revealed in its conversation.
struct PendingReveal {
    conversation_id: String,
    message_id: String,
    text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input.
    Ignored,
    /// Another send holds the guard.
    Busy,
    /// No conversation could be created; nothing was sent.
    Aborted,
    /// The reply was persisted and, if its conversation is still open, revealed.
    Replied,
    /// The webhook call failed and a diagnostic replaced the placeholder.
    Failed(WebhookError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwitchError {
    #[error("Failed to load conversation. Please try again.")]
    HistoryUnavailable(String),
}

/// Released on drop, so a send can never leave the session permanently busy.
struct SendGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> SendGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

type Observer = Box<dyn Fn(&SessionState)>;

pub struct ChatSession<S, W, F, K> {
    store: S,
    webhook: W,
    scheduler: F,
    identity: SessionIdentity<K>,
    reveal: RevealConfig,
    state: RefCell<SessionState>,
    in_flight: Cell<bool>,
    render_epoch: Cell<u64>,
    observer: RefCell<Option<Observer>>,
}

impl<S, W, F, K> ChatSession<S, W, F, K>
where
    S: ConversationStore,
    W: WebhookTransport,
    F: FrameScheduler,
    K: KeyValueStorage,
{
    pub fn new(store: S, webhook: W, scheduler: F, identity: SessionIdentity<K>) -> Self {
        Self {
            store,
            webhook,
            scheduler,
            identity,
            reveal: RevealConfig::default(),
            state: RefCell::new(SessionState::default()),
            in_flight: Cell::new(false),
            render_epoch: Cell::new(0),
            observer: RefCell::new(None),
        }
    }

    pub fn with_reveal(mut self, reveal: RevealConfig) -> Self {
        self.reveal = reveal;
        self
    }

    /// Called with the new state after every change.
    pub fn set_observer(&self, observer: impl Fn(&SessionState) + 'static) {
        *self.observer.borrow_mut() = Some(Box::new(observer));
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn session_id(&self) -> &str {
        self.identity.session_id()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.state.borrow().conversation_id.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.get()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn webhook(&self) -> &W {
        &self.webhook
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn identity(&self) -> &SessionIdentity<K> {
        &self.identity
    }

    fn update(&self, apply: impl FnOnce(&mut SessionState)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            apply(&mut state);
            state.clone()
        };
        if let Some(observer) = self.observer.borrow().as_ref() {
            observer(&snapshot);
        }
    }

    fn is_active(&self, conversation_id: &str) -> bool {
        self.state.borrow().conversation_id.as_deref() == Some(conversation_id)
    }

    fn bind(&self, conversation_id: Option<String>) {
        self.identity.remember_conversation(conversation_id.as_deref());
        self.update(|state| state.conversation_id = conversation_id);
    }

    /// Stops any running reveal before its next frame.
    pub fn cancel_render(&self) {
        self.render_epoch.set(self.render_epoch.get().wrapping_add(1));
    }

    /// Loads the sidebar and reopens the conversation that was active last.
    pub async fn restore(&self) -> Result<(), SwitchError> {
        self.refresh_sidebar().await;

        let Some(conversation_id) = self.identity.last_conversation() else {
            return Ok(());
        };

        info!("restoring conversation {conversation_id}");
        if let Err(e) = self.switch_conversation(&conversation_id, true).await {
            warn!("could not restore conversation {conversation_id}: {e}");
            self.identity.remember_conversation(None);
            return Err(e);
        }
        Ok(())
    }

    /// Reloads the sidebar; a failed fetch keeps the current list.
    pub async fn refresh_sidebar(&self) {
        match self.store.list_conversations(self.identity.session_id()).await {
            Some(mut conversations) => {
                sort_by_activity(&mut conversations);
                self.update(|state| state.conversations = conversations);
            }
            None => warn!("keeping stale conversation list"),
        }
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let Some(guard) = SendGuard::acquire(&self.in_flight) else {
            debug!("send already in flight, ignoring submit");
            return SubmitOutcome::Busy;
        };
        // a new submit supersedes any reveal still running
        self.cancel_render();
        self.update(|state| state.is_sending = true);

        let (outcome, pending) = self.send(text).await;

        drop(guard);
        self.update(|state| state.is_sending = false);

        if let Some(pending) = pending {
            self.play_reveal(&pending).await;
        }
        outcome
    }

    async fn send(&self, text: &str) -> (SubmitOutcome, Option<PendingReveal>) {
        let conversation_id = match self.conversation_id() {
            Some(id) => id,
            None => {
                let title = derive_title(text);
                let Some(conversation) = self
                    .store
                    .create_conversation(self.identity.session_id(), &title)
                    .await
                else {
                    error!("Failed to create conversation");
                    return (SubmitOutcome::Aborted, None);
                };
                self.bind(Some(conversation.id.clone()));
                self.refresh_sidebar().await;
                conversation.id
            }
        };

        let placeholder = ViewMessage::placeholder();
        let placeholder_id = placeholder.id.clone();
        self.update(|state| {
            state.messages.push(ViewMessage::user(text));
            state.messages.push(placeholder);
        });

        let request = WebhookRequest::send_message(self.identity.session_id(), text);
        let persist_user = async {
            if self.store.add_message(&conversation_id, Role::User, text).await.is_none() {
                warn!("user message in {conversation_id} was not persisted");
            }
        };
        let (_, response) = futures::join!(persist_user, self.webhook.send(&request));
        let reply = response.and_then(|response| response.into_reply());

        match reply {
            Err(err) => {
                error!("Error calling N8N webhook: {err}");
                // the view may have moved to another conversation while we waited
                if self.is_active(&conversation_id) {
                    let diagnostic = err.diagnostic(&request, self.webhook.endpoint());
                    self.update(|state| {
                        if let Some(message) = state.reply_slot(&placeholder_id, &diagnostic) {
                            message.text = diagnostic;
                            message.loading = false;
                            message.streaming = false;
                        }
                    });
                } else {
                    info!("discarding webhook error for inactive conversation {conversation_id}");
                }
                (SubmitOutcome::Failed(err), None)
            }
            Ok(reply) => {
                if self.store.add_message(&conversation_id, Role::Bot, &reply).await.is_none() {
                    warn!("bot reply in {conversation_id} was not persisted");
                }
                self.upgrade_title(&conversation_id, text).await;

                let pending = PendingReveal {
                    conversation_id,
                    message_id: placeholder_id,
                    text: reply,
                };
                (SubmitOutcome::Replied, Some(pending))
            }
        }
    }

    async fn play_reveal(&self, pending: &PendingReveal) {
        let PendingReveal {
            conversation_id,
            message_id,
            text,
        } = pending;
        if !self.is_active(conversation_id) {
            info!("reply for inactive conversation {conversation_id} stored without display");
            return;
        }

        self.cancel_render();
        let epoch = self.render_epoch.get();

        let mut on_screen = false;
        self.update(|state| {
            if let Some(message) = state.reply_slot(message_id, text) {
                message.loading = false;
                message.streaming = true;
                message.text.clear();
                on_screen = true;
            }
        });
        if !on_screen {
            return;
        }

        for frame in Reveal::new(text, self.reveal.chars_per_tick) {
            if self.render_epoch.get() != epoch {
                debug!("reveal of {message_id} cancelled");
                // show the whole reply if the message is still on screen
                self.update(|state| {
                    if let Some(message) = state.message_mut(message_id) {
                        message.text = text.to_string();
                        message.streaming = false;
                    }
                });
                return;
            }

            self.update(|state| {
                if let Some(message) = state.message_mut(message_id) {
                    message.text = frame.visible.to_string();
                    message.streaming = !frame.done;
                }
            });

            if !frame.done {
                self.scheduler.next_frame(self.reveal.frame_delay).await;
            }
        }
    }

    async fn upgrade_title(&self, conversation_id: &str, message: &str) {
        if message.chars().count() > TITLE_MAX_CHARS {
            return;
        }
        let Some(conversation) = self.store.get_conversation(conversation_id).await else {
            return;
        };
        if !should_upgrade_title(&conversation.title, message) {
            return;
        }
        if self.store.update_conversation_title(conversation_id, message).await {
            self.refresh_sidebar().await;
        }
    }

    pub async fn switch_conversation(&self, conversation_id: &str, force: bool) -> Result<(), SwitchError> {
        let already_loaded = {
            let state = self.state.borrow();
            state.conversation_id.as_deref() == Some(conversation_id) && !state.messages.is_empty()
        };
        if already_loaded && !force {
            return Ok(());
        }

        let Some(history) = self.store.list_messages(conversation_id).await else {
            error!("Error loading conversation {conversation_id}");
            return Err(SwitchError::HistoryUnavailable(conversation_id.to_string()));
        };

        self.cancel_render();
        self.update(|state| {
            state.messages = history.into_iter().map(ViewMessage::from).collect();
        });
        self.bind(Some(conversation_id.to_string()));
        Ok(())
    }

    pub fn new_conversation(&self) {
        self.cancel_render();
        self.update(|state| state.messages.clear());
        self.bind(None);
    }

    /// Deletes a conversation and its messages. Confirmation is the caller's job.
    pub async fn delete_conversation(&self, conversation_id: &str) -> bool {
        if !self.store.delete_conversation(conversation_id).await {
            self.refresh_sidebar().await;
            return false;
        }

        self.update(|state| state.conversations.retain(|c| c.id != conversation_id));
        if self.is_active(conversation_id) {
            self.new_conversation();
        }
        self.refresh_sidebar().await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_its_own_title() {
        assert_eq!(derive_title("Hello"), "Hello");
        let exactly_fifty = "a".repeat(50);
        assert_eq!(derive_title(&exactly_fifty), exactly_fifty);
    }

    #[test]
    fn test_long_message_is_truncated_with_ellipsis() {
        let long = "x".repeat(51);
        let title = derive_title(&long);
        assert_eq!(title, format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let long = "é".repeat(60);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 53);
    }

    #[test]
    fn test_title_upgrade_rule() {
        assert!(should_upgrade_title("New Chat", "Hello"));
        assert!(should_upgrade_title(&format!("{}...", "x".repeat(50)), "Hello"));
        assert!(!should_upgrade_title("Hello", "Hello"));
        assert!(!should_upgrade_title("Something else", "Hello"));
        assert!(!should_upgrade_title("New Chat", &"y".repeat(51)));
    }

    #[test]
    fn test_reply_slot_reuses_placeholder() {
        let placeholder = ViewMessage::placeholder();
        let id = placeholder.id.clone();
        let mut state = SessionState {
            messages: vec![ViewMessage::user("Hello"), placeholder],
            ..SessionState::default()
        };
        assert!(state.reply_slot(&id, "Hi").is_some());
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn test_reply_slot_after_reload() {
        let mut state = SessionState {
            messages: vec![ViewMessage::user("Hello")],
            ..SessionState::default()
        };
        let slot = state.reply_slot("bot-1", "Hi").map(|m| m.id.clone());
        assert_eq!(slot.as_deref(), Some("bot-1"));
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].role, Role::Bot);

        // reloaded history that already shows the reply gets no duplicate
        state.messages[1].text = "Hi".to_string();
        assert!(state.reply_slot("bot-2", "Hi").is_none());
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn test_send_guard_is_exclusive_and_released() {
        let flag = Cell::new(false);
        let guard = SendGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(SendGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(!flag.get());
        assert!(SendGuard::acquire(&flag).is_some());
    }
}
