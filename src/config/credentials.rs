//! API credentials, resolved once from settings and the environment.

use super::settings::CredentialSettings;
use crate::error::{PodsmithError, Result};

pub const UNDERSTANDING_KEY_ENV: &str = "PODSMITH_UNDERSTANDING_API_KEY";
pub const SCRIPT_KEY_ENV: &str = "PODSMITH_SCRIPT_API_KEY";
pub const SPEECH_KEY_ENV: &str = "PODSMITH_SPEECH_API_KEY";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ELEVENLABS_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// API keys for the three generative back-ends.
#[derive(Clone, Default)]
pub struct Credentials {
    pub understanding_api_key: Option<String>,
    pub script_api_key: Option<String>,
    pub speech_api_key: Option<String>,
}

impl Credentials {
    /// Resolve keys: config file first, then the stage-specific variable, then the provider variable.
    pub fn resolve(settings: &CredentialSettings) -> Self {
        Self::resolve_with(settings, |name| std::env::var(name).ok())
    }

    /// Like [`Credentials::resolve`] with an injectable environment lookup.
    pub fn resolve_with(settings: &CredentialSettings, env: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |configured: &Option<String>, primary: &str, fallback: &str| {
            let usable = |k: &String| !k.trim().is_empty();
            configured
                .clone()
                .filter(usable)
                .or_else(|| env(primary).filter(usable))
                .or_else(|| env(fallback).filter(usable))
        };

        Self {
            understanding_api_key: pick(
                &settings.understanding_api_key,
                UNDERSTANDING_KEY_ENV,
                OPENAI_KEY_ENV,
            ),
            script_api_key: pick(&settings.script_api_key, SCRIPT_KEY_ENV, OPENAI_KEY_ENV),
            speech_api_key: pick(&settings.speech_api_key, SPEECH_KEY_ENV, ELEVENLABS_KEY_ENV),
        }
    }

    /// Names of the environment variables for every missing key.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.understanding_api_key.is_none() {
            missing.push(UNDERSTANDING_KEY_ENV);
        }
        if self.script_api_key.is_none() {
            missing.push(SCRIPT_KEY_ENV);
        }
        if self.speech_api_key.is_none() {
            missing.push(SPEECH_KEY_ENV);
        }
        missing
    }

    /// Fail if any key is missing, naming all of them at once.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PodsmithError::Config(format!(
                "Missing API credentials: {}. Set them in the config file or environment.",
                missing.join(", ")
            )))
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("understanding_api_key", &mask(&self.understanding_api_key))
            .field("script_api_key", &mask(&self.script_api_key))
            .field("speech_api_key", &mask(&self.speech_api_key))
            .finish()
    }
}
