use std::cell::RefCell;
use std::collections::HashMap;
use uuid::Uuid;

pub const SESSION_KEY: &str = "chatbot_session_id";
pub const CONVERSATION_KEY: &str = "chatbot_conversation_id";
pub const DARK_MODE_KEY: &str = "chatbot_dark_mode";

/// Minimal string key/value store, shaped after `window.localStorage`.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// `localStorage` of the current window. Storage errors (private mode, quota)
/// degrade to a store that remembers nothing.
#[derive(Debug, Clone, Default)]
pub struct BrowserStorage {
    storage: Option<web_sys::Storage>,
}

impl BrowserStorage {
    pub fn local() -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable, session will not survive reloads");
        }
        Self { storage }
    }
}

impl KeyValueStorage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.set_item(key, value) {
                log::error!("failed to write {key} to localStorage: {e:?}");
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Durable client identity: the session token that partitions conversations
/// and the conversation that was open last.
#[derive(Debug)]
pub struct SessionIdentity<K> {
    storage: K,
    session_id: String,
}

impl<K: KeyValueStorage> SessionIdentity<K> {
    /// Loads the stored session token or mints and stores a new one.
    pub fn init(storage: K) -> Self {
        let session_id = match storage.get(SESSION_KEY).filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                storage.set(SESSION_KEY, &id);
                log::info!("created new chat session {id}");
                id
            }
        };
        Self { storage, session_id }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn last_conversation(&self) -> Option<String> {
        self.storage.get(CONVERSATION_KEY).filter(|id| !id.is_empty())
    }

    pub fn remember_conversation(&self, conversation_id: Option<&str>) {
        match conversation_id {
            Some(id) => self.storage.set(CONVERSATION_KEY, id),
            None => self.storage.remove(CONVERSATION_KEY),
        }
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }
}

pub fn load_dark_mode(storage: &impl KeyValueStorage) -> Option<bool> {
    storage.get(DARK_MODE_KEY).and_then(|value| value.parse().ok())
}

pub fn store_dark_mode(storage: &impl KeyValueStorage, is_dark: bool) {
    storage.set(DARK_MODE_KEY, &is_dark.to_string());
}
