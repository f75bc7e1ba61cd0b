use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "ssr")] {
        use axum::extract::FromRef;
        use leptos::prelude::LeptosOptions;
        use std::sync::Arc;

        use crate::config::AppConfig;

        #[derive(FromRef, Clone)]
        pub struct AppState {
            pub leptos_options: LeptosOptions,
            pub config: Arc<AppConfig>,
            pub http: reqwest::Client,
        }

        impl AppState {
            pub fn new(leptos_options: LeptosOptions, config: AppConfig) -> Self {
                Self {
                    leptos_options,
                    config: Arc::new(config),
                    http: reqwest::Client::new(),
                }
            }
        }
    }
}
