//! Error types for Podsmith.

use thiserror::Error;

/// Pipeline stage names, used to tag stage-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Ingest,
    Understand,
    Script,
    Synthesize,
    Deliver,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Ingest => write!(f, "ingestion"),
            PipelineStage::Understand => write!(f, "content understanding"),
            PipelineStage::Script => write!(f, "script generation"),
            PipelineStage::Synthesize => write!(f, "voice synthesis"),
            PipelineStage::Deliver => write!(f, "delivery"),
        }
    }
}

/// Library-level error type for Podsmith operations.
#[derive(Error, Debug)]
pub enum PodsmithError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    #[error("No structured output found in model response")]
    NoStructuredOutput { raw: String },

    #[error("Malformed model output: {reason}")]
    MalformedOutput { reason: String, raw: String },

    #[error("Content understanding failed while extracting {step}: {source}")]
    Understanding {
        step: &'static str,
        #[source]
        source: Box<PodsmithError>,
    },

    #[error("Script generation failed while generating {step}: {source}")]
    Script {
        step: &'static str,
        #[source]
        source: Box<PodsmithError>,
    },

    #[error("No voices available for assignment")]
    NoVoicesAvailable,

    #[error("Voice synthesis failed: {0}")]
    Synthesis(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Generation API error: {0}")]
    Generation(String),

    #[error("Pipeline failed during {stage}: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: Box<PodsmithError>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PodsmithError {
    /// Tag a failure with the pipeline stage it came from.
    pub fn at_stage(self, stage: PipelineStage) -> Self {
        PodsmithError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage a pipeline-level error was raised in, if tagged.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            PodsmithError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The raw, unparsed model text behind a repair failure, looking through wrappers.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            PodsmithError::NoStructuredOutput { raw } => Some(raw),
            PodsmithError::MalformedOutput { raw, .. } => Some(raw),
            PodsmithError::Understanding { source, .. }
            | PodsmithError::Script { source, .. }
            | PodsmithError::Stage { source, .. } => source.raw_output(),
            _ => None,
        }
    }

    /// Whether this is a repair-layer failure (as opposed to a call failure).
    pub fn is_output_error(&self) -> bool {
        matches!(
            self,
            PodsmithError::NoStructuredOutput { .. } | PodsmithError::MalformedOutput { .. }
        )
    }
}

/// Result type alias for Podsmith operations.
pub type Result<T> = std::result::Result<T, PodsmithError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_output_through_wrappers() {
        let err = PodsmithError::MalformedOutput {
            reason: "expected value".to_string(),
            raw: "[{oops".to_string(),
        };
        let wrapped = PodsmithError::Script {
            step: "dialogue",
            source: Box::new(err),
        }
        .at_stage(PipelineStage::Script);

        assert_eq!(wrapped.raw_output(), Some("[{oops"));
        assert_eq!(wrapped.stage(), Some(PipelineStage::Script));
        assert!(wrapped.to_string().contains("script generation"));
    }

    #[test]
    fn test_output_error_classification() {
        assert!(PodsmithError::NoStructuredOutput { raw: String::new() }.is_output_error());
        assert!(!PodsmithError::NoVoicesAvailable.is_output_error());
    }
}
