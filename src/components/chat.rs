use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

/// Message composer. Enter sends, Shift+Enter inserts a newline.
#[component]
pub fn Composer(
    input: ReadSignal<String>,
    set_input: WriteSignal<String>,
    is_sending: Signal<bool>,
    #[prop(into)] on_send: Callback<()>,
) -> impl IntoView {
    let can_send = move || !input.get().trim().is_empty() && !is_sending.get();

    let resize = |target: &HtmlElement| {
        let style = target.style();
        let _ = style.set_property("height", "auto");
        let _ = style.set_property("height", &format!("{}px", target.scroll_height()));
    };

    view! {
        <div class="bg-white dark:bg-gray-900 border-t border-gray-200 dark:border-gray-700 px-4 py-4">
            <div class="max-w-4xl mx-auto">
                <div class="flex items-end gap-3">
                    <textarea
                        rows="1"
                        class="flex-1 bg-gray-100 dark:bg-gray-800 text-gray-900 dark:text-gray-100 rounded-3xl px-5 py-3 text-[15px] resize-none max-h-32
                        focus:outline-none focus:ring-2 focus:ring-red-500 placeholder-gray-500 dark:placeholder-gray-400"
                        placeholder="Type a message..."
                        prop:value=input
                        on:input=move |event| {
                            set_input.set(event_target_value(&event));
                            if let Some(target) = event
                                .target()
                                .and_then(|target| target.dyn_into::<HtmlElement>().ok())
                            {
                                resize(&target);
                            }
                        }
                        on:keydown=move |event| {
                            if event.key() == "Enter" && !event.shift_key() {
                                event.prevent_default();
                                if can_send() {
                                    on_send.run(());
                                }
                            }
                        }
                    ></textarea>
                    <button
                        class="flex-shrink-0 w-12 h-12 bg-red-500 rounded-full flex items-center justify-center text-white
                        hover:bg-red-600 transition-colors disabled:opacity-50 disabled:cursor-not-allowed"
                        title="Send"
                        disabled=move || !can_send()
                        on:click=move |_| on_send.run(())
                    >
                        "➤"
                    </button>
                </div>
                <p class="text-xs text-gray-400 text-center mt-3">
                    "Easy GPT can make mistakes. Please verify important information."
                </p>
            </div>
        </div>
    }
}
