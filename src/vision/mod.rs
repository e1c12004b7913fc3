//! Vision model layer
//!
//! The extraction pipeline talks to the hosted vision model through the
//! [`VisionModel`] trait so the batch orchestrator can be tested against a
//! scripted mock. The only production implementation is [`GeminiClient`].

mod extractor;
mod gemini;

pub use extractor::{BatchExtractor, BatchOutcome, ExtractionOutput};
pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::AppError;

/// Instruction sent with every batch of page images.
///
/// Asks for verbatim transcription: no invented headers, no page markers,
/// no markdown. Kept as a constant so prompt changes never touch the
/// orchestration logic.
pub const EXTRACTION_PROMPT: &str = "Extract the text EXACTLY as it appears in these images. \
Do NOT add any headers, page numbers, or metadata that are not visible in the image. \
Do NOT use markdown for page breaks. Just output the raw text content sequentially.";

/// Errors from a single vision model call
#[derive(Debug, Clone, thiserror::Error)]
pub enum VisionError {
    /// Rate/quota limit hit; the whole operation should abort and the
    /// caller retry later.
    #[error("API quota exceeded")]
    QuotaExceeded,

    /// The requested model does not exist or is not accessible with this
    /// key. Fatal configuration problem.
    #[error("Model '{0}' not found or not available")]
    ModelNotFound(String),

    /// No usable credential; checked before any call is issued.
    #[error("API key is missing or invalid")]
    MissingApiKey,

    /// Any other per-call failure (network, 5xx, malformed response). The
    /// orchestrator treats these as transient and skips the batch.
    #[error("API error: {0}")]
    Api(String),
}

impl From<VisionError> for AppError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::QuotaExceeded => AppError::QuotaExceeded,
            VisionError::ModelNotFound(model) => AppError::ModelUnavailable(model),
            VisionError::MissingApiKey => AppError::MissingApiKey,
            VisionError::Api(msg) => AppError::Internal(format!("Gemini Vision error: {}", msg)),
        }
    }
}

/// A hosted model that turns images plus an instruction into text
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Issue one generation call carrying the prompt and all images.
    async fn generate(&self, prompt: &str, images: &[Vec<u8>]) -> Result<String, VisionError>;
}
