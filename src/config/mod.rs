//! Configuration module for Podsmith.
//!
//! Handles loading settings, resolving API credentials, and prompt templates.

mod credentials;
mod prompts;
mod settings;

pub use credentials::{
    Credentials, ELEVENLABS_KEY_ENV, OPENAI_KEY_ENV, SCRIPT_KEY_ENV, SPEECH_KEY_ENV,
    UNDERSTANDING_KEY_ENV,
};
pub use prompts::{PromptPair, Prompts, ScriptPrompts, UnderstandingPrompts};
pub use settings::{
    CredentialSettings, DeliverySettings, GeneralSettings, IngestionSettings, PromptSettings,
    ScriptSettings, Settings, SpeechSettings, UnderstandingSettings,
};
