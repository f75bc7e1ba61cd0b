use leptos::html::Div;
use leptos::prelude::*;

use crate::components::markdown::MarkdownRenderer;
use crate::models::conversations::ViewMessage;

/// Empty-state prompts; clicking one fills the composer.
pub const SUGGESTIONS: [(&str, &str); 4] = [
    ("📝 Loan Application", "Guide me through the loan application process"),
    ("💳 Credit Score", "What are the CIBIL score requirements?"),
    ("📋 Documentation", "What documents do I need to submit?"),
    ("💰 EMI Calculator", "Help me calculate my monthly EMI"),
];

#[component]
pub fn MessageList(
    messages: Signal<Vec<ViewMessage>>,
    #[prop(into)] on_suggestion: Callback<String>,
) -> impl IntoView {
    let scroll_ref = NodeRef::<Div>::new();

    // keep the newest frame of a reveal in view
    Effect::new(move |_| {
        messages.track();
        if let Some(container) = scroll_ref.get() {
            container.set_scroll_top(container.scroll_height());
        }
    });

    view! {
        <div node_ref=scroll_ref class="flex-1 overflow-y-auto px-4 py-6 space-y-4">
            {move || {
                if messages.with(|messages| messages.is_empty()) {
                    view! { <EmptyState on_suggestion=on_suggestion /> }.into_any()
                } else {
                    view! {
                        <For
                            each=move || messages.get()
                            key=bubble_key
                            children=move |message| {
                                let id = message.id.clone();
                                let text = Signal::derive(move || {
                                    messages
                                        .with(|messages| {
                                            messages.iter().find(|m| m.id == id).map(|m| m.text.clone())
                                        })
                                        .unwrap_or_default()
                                });
                                view! { <MessageBubble message=message text=text /> }
                            }
                        />
                    }
                        .into_any()
                }
            }}
        </div>
    }
}

#[component]
fn EmptyState(on_suggestion: Callback<String>) -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center h-full text-center px-4">
            <div class="w-16 h-16 bg-red-100 dark:bg-red-900/40 rounded-full flex items-center justify-center mb-6 text-3xl">
                "💬"
            </div>
            <h2 class="text-2xl font-bold text-gray-900 dark:text-gray-100 mb-2">"How can I help you today?"</h2>
            <p class="text-gray-500 dark:text-gray-400 mb-8">"Ask me anything about Easy Home Finance Limited"</p>
            <div class="grid grid-cols-1 md:grid-cols-2 gap-3 max-w-2xl w-full">
                {SUGGESTIONS
                    .iter()
                    .map(|(title, prompt)| {
                        let prompt = prompt.to_string();
                        let on_click_prompt = prompt.clone();
                        view! {
                            <button
                                class="bg-white dark:bg-gray-800 border border-gray-200 dark:border-gray-700 rounded-xl p-4
                                hover:bg-gray-50 dark:hover:bg-gray-700 transition-colors text-left"
                                on:click=move |_| on_suggestion.run(on_click_prompt.clone())
                            >
                                <p class="font-medium text-gray-900 dark:text-gray-100 mb-1">{*title}</p>
                                <p class="text-sm text-gray-500 dark:text-gray-400">{prompt}</p>
                            </button>
                        }
                    })
                    .collect_view()}
            </div>
        </div>
    }
}

/// Bubbles are rebuilt when their state changes, not on every revealed
/// character; the text is fed through a signal instead.
pub fn bubble_key(message: &ViewMessage) -> (String, bool, bool) {
    (message.id.clone(), message.loading, message.streaming)
}

#[component]
fn MessageBubble(message: ViewMessage, text: Signal<String>) -> impl IntoView {
    let is_user = message.is_user();

    let bubble_class = if is_user {
        "bg-red-500 text-white rounded-l-3xl rounded-tr-3xl rounded-br-md"
    } else {
        "bg-white dark:bg-gray-800 text-gray-900 dark:text-gray-100 rounded-r-3xl rounded-tl-3xl rounded-bl-md shadow-sm"
    };

    let body = if message.loading {
        view! { <LoadingDots /> }.into_any()
    } else if is_user {
        view! { <div class="whitespace-pre-wrap text-[15px] leading-relaxed">{move || text.get()}</div> }.into_any()
    } else {
        view! {
            <div class="text-[15px] leading-relaxed">
                {move || view! { <MarkdownRenderer content=text.get() /> }}
                {message
                    .streaming
                    .then(|| view! { <span class="streaming-caret">"▍"</span> })}
            </div>
        }
            .into_any()
    };

    view! {
        <div class="flex items-start gap-3">
            {(!is_user)
                .then(|| {
                    view! {
                        <div class="flex-shrink-0 w-10 h-10 bg-red-100 dark:bg-red-900/40 rounded-full flex items-center justify-center">
                            "🤖"
                        </div>
                    }
                })}
            <div class=format!(
                "flex-1 flex {}",
                if is_user { "justify-end" } else { "justify-start" },
            )>
                <div class=format!("max-w-[85%] {bubble_class} px-5 py-3")>{body}</div>
            </div>
            {is_user
                .then(|| {
                    view! {
                        <div class="flex-shrink-0 w-10 h-10 bg-red-100 dark:bg-red-900/40 rounded-full flex items-center justify-center">
                            "👤"
                        </div>
                    }
                })}
        </div>
    }
}

#[component]
fn LoadingDots() -> impl IntoView {
    view! {
        <div class="flex gap-1 py-2" aria-label="Loading">
            <div class="w-2 h-2 bg-gray-400 rounded-full animate-bounce" style="animation-delay: 0ms"></div>
            <div class="w-2 h-2 bg-gray-400 rounded-full animate-bounce" style="animation-delay: 150ms"></div>
            <div class="w-2 h-2 bg-gray-400 rounded-full animate-bounce" style="animation-delay: 300ms"></div>
        </div>
    }
}
