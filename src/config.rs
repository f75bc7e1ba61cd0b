use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_N8N_BASE_URL: &str = "http://localhost:5678";
pub const DEFAULT_N8N_WEBHOOK_PATH: &str = "/webhook/e61a4f26-156f-4802-ae33-743399345186/chat";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVar(String),
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvironmentVar(name.to_string()))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: required("SUPABASE_URL")?,
            key: required("SUPABASE_KEY")?,
        })
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url.trim_end_matches('/'))
    }
}

/// Where the n8n workflow listens. Shared with the client so diagnostics can
/// point at the right workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    pub base_url: String,
    pub path: String,
}

impl Default for WebhookEndpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_N8N_BASE_URL.to_string(),
            path: DEFAULT_N8N_WEBHOOK_PATH.to_string(),
        }
    }
}

impl WebhookEndpoint {
    pub fn from_env() -> Self {
        Self {
            base_url: optional("N8N_BASE_URL", DEFAULT_N8N_BASE_URL),
            path: optional("N8N_WEBHOOK_PATH", DEFAULT_N8N_WEBHOOK_PATH),
        }
    }

    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{base}{}", self.path)
        } else {
            format!("{base}/{}", self.path)
        }
    }

    /// The id segment of a `/webhook/<id>/...` path, or the whole path.
    pub fn webhook_id(&self) -> &str {
        self.path
            .trim_start_matches('/')
            .strip_prefix("webhook/")
            .and_then(|rest| rest.split('/').next())
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub supabase: SupabaseConfig,
    pub webhook: WebhookEndpoint,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            supabase: SupabaseConfig::from_env()?,
            webhook: WebhookEndpoint::from_env(),
        })
    }
}

/// Pacing of the reply reveal animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealConfig {
    pub chars_per_tick: usize,
    pub frame_delay: Duration,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            chars_per_tick: 3,
            frame_delay: Duration::from_millis(16),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url_joins_base_and_path() {
        let endpoint = WebhookEndpoint {
            base_url: "http://n8n.local:5678/".to_string(),
            path: "webhook/abc/chat".to_string(),
        };
        assert_eq!(endpoint.url(), "http://n8n.local:5678/webhook/abc/chat");
    }

    #[test]
    fn test_webhook_id_from_default_path() {
        let endpoint = WebhookEndpoint::default();
        assert_eq!(endpoint.webhook_id(), "e61a4f26-156f-4802-ae33-743399345186");
        assert_eq!(
            endpoint.url(),
            "http://localhost:5678/webhook/e61a4f26-156f-4802-ae33-743399345186/chat"
        );
    }

    #[test]
    fn test_webhook_id_for_custom_path() {
        let endpoint = WebhookEndpoint {
            base_url: DEFAULT_N8N_BASE_URL.to_string(),
            path: "/hooks/chat".to_string(),
        };
        assert_eq!(endpoint.webhook_id(), "/hooks/chat");
    }

    #[test]
    fn test_rest_url() {
        let config = SupabaseConfig {
            url: "https://project.supabase.co/".to_string(),
            key: "anon".to_string(),
        };
        assert_eq!(config.rest_url(), "https://project.supabase.co/rest/v1");
    }
}
