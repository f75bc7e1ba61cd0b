use chrono::Utc;
use leptos::{prelude::*, task::spawn_local};
use log::{debug, error, info};
use std::rc::Rc;
use std::time::Duration;

use crate::chat_session::{ChatSession, SessionState, SubmitOutcome};
use crate::components::chat::Composer;
use crate::components::conversationlist::ConversationList;
use crate::components::dark_mode_toggle::DarkModeToggle;
use crate::components::messagelist::MessageList;
use crate::components::toast::Toast;
use crate::config::WebhookEndpoint;
use crate::identity::{BrowserStorage, SessionIdentity};
use crate::server_fn::webhook::webhook_endpoint;
use crate::store::SupabaseStore;
use crate::streaming::TimeoutScheduler;
use crate::webhook::N8nWebhook;

type LiveSession = ChatSession<SupabaseStore, N8nWebhook, TimeoutScheduler, BrowserStorage>;

#[component]
pub fn ChatRoom() -> impl IntoView {
    let (show_sidebar, set_show_sidebar) = signal(true);
    let (state, set_state) = signal(SessionState::default());
    let (input, set_input) = signal(String::new());
    let (loading_history, set_loading_history) = signal(true);
    let (toast_visible, set_toast_visible) = signal(false);
    let (toast_message, set_toast_message) = signal(String::new());

    // the session touches localStorage, so it only exists in the browser
    let session = StoredValue::new_local(None::<Rc<LiveSession>>);

    let show_toast = move |msg: String| {
        set_toast_message.set(msg);
        set_toast_visible.set(true);
        set_timeout(move || set_toast_visible.set(false), Duration::from_secs(5));
    };

    Effect::new(move |_| {
        if session.with_value(|session| session.is_some()) {
            return;
        }

        spawn_local(async move {
            let endpoint = match webhook_endpoint().await {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    error!("Failed to load webhook endpoint, using default: {e}");
                    WebhookEndpoint::default()
                }
            };

            let identity = SessionIdentity::init(BrowserStorage::local());
            info!("chat session {}", identity.session_id());

            let chat = Rc::new(ChatSession::new(
                SupabaseStore,
                N8nWebhook::new(endpoint),
                TimeoutScheduler,
                identity,
            ));
            chat.set_observer(move |snapshot| set_state.set(snapshot.clone()));
            session.set_value(Some(Rc::clone(&chat)));

            let restored = chat.restore().await;
            set_loading_history.set(false);
            if let Err(e) = restored {
                show_toast(e.to_string());
            }
        });
    });

    on_cleanup(move || {
        if let Some(Some(chat)) = session.try_get_value() {
            chat.cancel_render();
        }
    });

    let send_message = move || {
        let Some(chat) = session.get_value() else {
            return;
        };
        let text = input.get_untracked();
        if text.trim().is_empty() || chat.is_sending() {
            return;
        }

        set_input.set(String::new());
        spawn_local(async move {
            match chat.submit(&text).await {
                SubmitOutcome::Aborted => {
                    set_input.set(text);
                    show_toast("Failed to start a conversation. Please try again.".to_string());
                }
                outcome => debug!("submit finished: {outcome:?}"),
            }
        });
    };

    let select_conversation = move |conversation_id: String| {
        let Some(chat) = session.get_value() else {
            return;
        };
        spawn_local(async move {
            if let Err(e) = chat.switch_conversation(&conversation_id, false).await {
                show_toast(e.to_string());
            }
        });
    };

    let new_conversation = move || {
        if let Some(chat) = session.get_value() {
            chat.new_conversation();
        }
    };

    let delete_conversation = move |conversation_id: String| {
        let Some(chat) = session.get_value() else {
            return;
        };
        let confirmed = window()
            .confirm_with_message("Delete this conversation?")
            .unwrap_or(false);
        if !confirmed {
            return;
        }
        spawn_local(async move {
            if !chat.delete_conversation(&conversation_id).await {
                show_toast("Failed to delete conversation. Please try again.".to_string());
            }
        });
    };

    let messages = Signal::derive(move || state.with(|state| state.messages.clone()));
    let history = Signal::derive(move || state.with(|state| state.history(Utc::now())));
    let is_sending = Signal::derive(move || state.with(|state| state.is_sending));
    let loading = Signal::derive(move || loading_history.get());

    view! {
        <div class="flex h-screen bg-gray-50 dark:bg-gray-950">
            <div class=move || {
                let base_class = "bg-gray-900 text-white transition-all duration-300 ease-in-out overflow-hidden flex-shrink-0 flex flex-col";
                if show_sidebar.get() {
                    format!("{base_class} w-72")
                } else {
                    format!("{base_class} w-0")
                }
            }>
                <div class="w-72 h-full">
                    <ConversationList
                        history=history
                        loading=loading
                        on_select=select_conversation
                        on_new=move |_| new_conversation()
                        on_delete=delete_conversation
                    />
                </div>
            </div>

            <div class="flex-1 flex flex-col min-w-0">
                <div class="bg-white dark:bg-gray-900 shadow-sm px-4 py-4 flex items-center justify-between">
                    <div class="flex items-center gap-4">
                        <button
                            class="text-gray-700 hover:text-gray-900 dark:text-gray-200 dark:hover:text-white text-xl"
                            title="Toggle sidebar"
                            on:click=move |_| set_show_sidebar.update(|v| *v = !*v)
                        >
                            "☰"
                        </button>
                        <h1 class="text-xl font-bold text-gray-900 dark:text-gray-100">"Easy GPT"</h1>
                    </div>
                    <DarkModeToggle />
                </div>

                <MessageList
                    messages=messages
                    on_suggestion=move |prompt: String| set_input.set(prompt)
                />

                <Composer
                    input=input
                    set_input=set_input
                    is_sending=is_sending
                    on_send=move |_| send_message()
                />
            </div>

            <Toast
                message=toast_message
                visible=toast_visible
                on_close=move || set_toast_visible.set(false)
            />
        </div>
    }
}
