use std::fmt;

use tracing::{debug, warn};

use crate::core::keyring::KeyringStore;
use crate::core::session::ProviderError;

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Env(&'static str),
    Keyring,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Env(var) => write!(f, "environment variable {var}"),
            KeySource::Keyring => write!(f, "system keyring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: String,
    pub source: KeySource,
}

pub fn resolve_api_key(env_only: bool) -> Result<ResolvedKey, ProviderError> {
    let keyring = (!env_only).then(KeyringStore::default);
    resolve_api_key_with(|name| std::env::var(name).ok(), keyring.as_ref())
}

/// Looks up the key in `env` first, then in `keyring` when one is given.
///
/// A keyring that cannot be read is treated like an empty one.
pub fn resolve_api_key_with<F>(
    env: F,
    keyring: Option<&KeyringStore>,
) -> Result<ResolvedKey, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    for var in API_KEY_ENV_VARS {
        if let Some(key) = env(var).filter(|k| !k.trim().is_empty()) {
            debug!(source = var, "using API key from environment");
            return Ok(ResolvedKey {
                key: key.trim().to_string(),
                source: KeySource::Env(var),
            });
        }
    }

    if let Some(store) = keyring {
        match store.get_api_key() {
            Ok(Some(key)) if !key.trim().is_empty() => {
                return Ok(ResolvedKey {
                    key: key.trim().to_string(),
                    source: KeySource::Keyring,
                })
            }
            Ok(_) => {}
            Err(err) => warn!("keyring lookup failed: {err}"),
        }
    }

    Err(ProviderError::unavailable(missing_key_reason(keyring.is_some())))
}

fn missing_key_reason(checked_keyring: bool) -> String {
    let vars = API_KEY_ENV_VARS.join(" or ");
    if checked_keyring {
        format!("no API key found. Set {vars}, or run `gemini-chat auth`")
    } else {
        format!("no API key found. Set {vars}")
    }
}
