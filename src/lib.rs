pub mod app;
pub mod chat_session;
pub mod components;
pub mod config;
pub mod identity;
#[cfg(feature = "ssr")]
pub mod middleware;
pub mod models;
pub mod pages;
pub mod server_fn;
pub mod state;
pub mod store;
pub mod streaming;
#[cfg(feature = "ssr")]
pub mod supabase;
pub mod webhook;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
