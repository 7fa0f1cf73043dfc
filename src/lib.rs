//! Podsmith - multi-speaker podcasts from anything you can read
//!
//! Podsmith takes a web page, PDF, video or plain text and turns it into a
//! narrated conversation between several AI hosts, delivered as an audio file
//! with a transcript and metadata.
//!
//! # Overview
//!
//! A run goes through five stages:
//! - Ingest the source into ordered text blocks
//! - Extract topics, entities and relationships into a knowledge graph
//! - Write a multi-speaker script with a narrator introduction and conclusion
//! - Voice every line and lay the segments out on one timeline
//! - Package the audio, transcript and metadata
//!
//! # Architecture
//!
//! - `config` - Settings, credentials and prompt templates
//! - `ingest` - Source adapters (web, document, video, text)
//! - `generation` - Text generation back-ends
//! - `repair` - Recovery of structured data from model output
//! - `retry` - Retry with backoff and cancellation
//! - `understanding` - Knowledge graph extraction
//! - `script` - Script writing
//! - `speech` - Voice assignment, synthesis and timeline assembly
//! - `delivery` - Packaging and storage
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use podsmith::config::Settings;
//! use podsmith::ingest::SourceInput;
//! use podsmith::orchestrator::{Orchestrator, PipelineOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let input = SourceInput::classify("https://example.com/article")?;
//!     let run = orchestrator.run(&input, &PipelineOptions::default()).await?;
//!     println!("Wrote {}", run.package.audio_url);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod generation;
pub mod ingest;
pub mod openai;
pub mod orchestrator;
pub mod repair;
pub mod retry;
pub mod script;
pub mod speech;
pub mod understanding;

pub use error::{PodsmithError, Result};
