use leptos::prelude::*;

use crate::models::conversations::ChatHistoryItem;

#[component]
pub fn ConversationList(
    history: Signal<Vec<ChatHistoryItem>>,
    loading: Signal<bool>,
    #[prop(into)] on_select: Callback<String>,
    #[prop(into)] on_new: Callback<()>,
    #[prop(into)] on_delete: Callback<String>,
) -> impl IntoView {
    view! {
        <div class="flex flex-col h-full">
            <div class="p-3">
                <button
                    class="w-full flex items-center gap-3 px-4 py-3 border border-gray-700 hover:bg-gray-800 rounded-lg transition-colors text-sm"
                    on:click=move |_| on_new.run(())
                >
                    <span>"+"</span>
                    <span>"New Chat"</span>
                </button>
            </div>
            <div class="flex-1 overflow-y-auto px-3 space-y-1">
                {move || {
                    if loading.get() {
                        view! {
                            <div class="text-center text-gray-400 py-8">"Loading conversations..."</div>
                        }
                            .into_any()
                    } else if history.with(|items| items.is_empty()) {
                        view! {
                            <div class="text-center text-gray-400 py-8 text-sm">"No conversations yet"</div>
                        }
                            .into_any()
                    } else {
                        view! {
                            <For
                                each=move || history.get()
                                key=|item| (item.id.clone(), item.title.clone(), item.date.clone(), item.active)
                                children=move |item| {
                                    view! {
                                        <ConversationRow
                                            item=item
                                            on_select=on_select
                                            on_delete=on_delete
                                        />
                                    }
                                }
                            />
                        }
                            .into_any()
                    }
                }}
            </div>
        </div>
    }
}

#[component]
fn ConversationRow(
    item: ChatHistoryItem,
    on_select: Callback<String>,
    on_delete: Callback<String>,
) -> impl IntoView {
    let id_for_select = item.id.clone();
    let id_for_delete = item.id.clone();

    view! {
        <div class="group relative">
            <button
                class=format!(
                    "w-full text-left px-3 py-3 rounded-lg hover:bg-gray-800 transition-colors {}",
                    if item.active { "bg-gray-800" } else { "" },
                )
                on:click=move |_| {
                    log::debug!("Clicked conversation: {id_for_select}");
                    on_select.run(id_for_select.clone());
                }
            >
                <div class="flex items-start gap-3">
                    <span class="mt-0.5 flex-shrink-0">"💬"</span>
                    <div class="flex-1 min-w-0">
                        <p class="text-sm font-medium truncate">{item.title}</p>
                        <p class="text-xs text-gray-400 mt-0.5">{item.date}</p>
                    </div>
                </div>
            </button>
            <div class="absolute right-2 top-3 hidden group-hover:flex items-center gap-1">
                <button
                    class="p-1 hover:bg-gray-700 rounded text-xs"
                    title="Delete conversation"
                    on:click=move |event| {
                        event.stop_propagation();
                        on_delete.run(id_for_delete.clone());
                    }
                >
                    "🗑"
                </button>
            </div>
        </div>
    }
}
