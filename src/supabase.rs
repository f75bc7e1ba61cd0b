use once_cell::sync::OnceCell;
use postgrest::Postgrest;

use crate::config::{ConfigError, SupabaseConfig};

static CLIENT: OnceCell<Postgrest> = OnceCell::new();

pub fn get_client() -> Result<&'static Postgrest, ConfigError> {
    CLIENT.get_or_try_init(|| {
        let config = SupabaseConfig::from_env()?;
        let key = config.key.clone();

        let client = Postgrest::new(config.rest_url())
            .insert_header("apikey", &key)
            .insert_header("Authorization", format!("Bearer {key}"));

        log::debug!("Supabase client created");
        Ok(client)
    })
}
