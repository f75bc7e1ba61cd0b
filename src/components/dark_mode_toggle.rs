use leptos::prelude::*;

use crate::identity::{load_dark_mode, store_dark_mode, BrowserStorage};

#[component]
pub fn DarkModeToggle() -> impl IntoView {
    let (is_dark, set_is_dark) = signal(false);

    Effect::new(move |_| {
        if let Some(dark_mode) = load_dark_mode(&BrowserStorage::local()) {
            set_is_dark.set(dark_mode);
            apply_dark_mode(dark_mode);
        }
    });

    let toggle_dark_mode = move |_| {
        let new_state = !is_dark.get_untracked();
        set_is_dark.set(new_state);
        apply_dark_mode(new_state);
        store_dark_mode(&BrowserStorage::local(), new_state);
    };

    view! {
        <button
            class="text-gray-700 hover:text-gray-900 dark:text-gray-200 dark:hover:text-white"
            title="Toggle dark mode"
            on:click=toggle_dark_mode
        >
            {move || if is_dark.get() { "🌞" } else { "🌙" }}
        </button>
    }
}

fn apply_dark_mode(is_dark: bool) {
    if let Some(body) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.body())
    {
        let _ = if is_dark {
            body.class_list().add_1("dark")
        } else {
            body.class_list().remove_1("dark")
        };
    }
}
