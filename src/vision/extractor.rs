//! Batch extraction orchestrator
//!
//! Turns an ordered sequence of page images into one text result through
//! repeated vision model calls. Pages are grouped into fixed-size batches
//! (fewer requests per document keeps the free-tier 15 RPM quota workable),
//! with a pacing delay before every batch after the first.
//!
//! Failure handling is deliberately uneven:
//! - quota exhaustion and a missing model abort the whole run;
//! - any other per-batch failure is recorded and skipped, so one bad batch
//!   costs its pages but not the document. Skips are surfaced as tagged
//!   outcomes rather than silently folded away.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use super::{VisionError, VisionModel, EXTRACTION_PROMPT};

/// Result of one batch call
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// Text returned for the batch (possibly empty).
    Ok(String),
    /// The batch failed with a transient error and contributed no text.
    Skipped { batch: usize, reason: String },
}

/// Aggregated result of a full extraction run
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutput {
    /// Concatenated batch texts in page order, each non-empty batch
    /// followed by a blank-line separator.
    pub text: String,
    /// Human-readable reasons for every skipped batch.
    pub skipped: Vec<String>,
}

/// Batched vision extraction over a [`VisionModel`]
pub struct BatchExtractor {
    model: Arc<dyn VisionModel>,
    batch_size: usize,
    pacing: Duration,
}

impl BatchExtractor {
    pub fn new(model: Arc<dyn VisionModel>, batch_size: usize, pacing: Duration) -> Self {
        // chunks() panics on zero
        let batch_size = batch_size.max(1);
        Self {
            model,
            batch_size,
            pacing,
        }
    }

    /// Extract text from the given page images.
    ///
    /// Issues ceil(N / batch_size) model calls in page order; zero images
    /// means zero calls and an empty output.
    pub async fn extract(&self, images: &[Vec<u8>]) -> Result<ExtractionOutput, VisionError> {
        let mut outcomes = Vec::new();

        for (index, batch) in images.chunks(self.batch_size).enumerate() {
            if index > 0 {
                sleep(self.pacing).await;
            }

            match self.model.generate(EXTRACTION_PROMPT, batch).await {
                Ok(text) => {
                    tracing::debug!(batch = index, chars = text.len(), "Batch extracted");
                    outcomes.push(BatchOutcome::Ok(text));
                }
                // Quota means every further call would fail the same way;
                // abort so the caller can retry the whole upload later.
                Err(VisionError::QuotaExceeded) => return Err(VisionError::QuotaExceeded),
                Err(err @ VisionError::ModelNotFound(_)) => return Err(err),
                Err(err @ VisionError::MissingApiKey) => return Err(err),
                Err(VisionError::Api(reason)) => {
                    tracing::warn!(batch = index, reason = %reason, "Batch failed, skipping");
                    outcomes.push(BatchOutcome::Skipped {
                        batch: index,
                        reason,
                    });
                }
            }
        }

        Ok(fold_outcomes(outcomes))
    }
}

/// Fold per-batch outcomes into the final text plus skip reasons.
fn fold_outcomes(outcomes: Vec<BatchOutcome>) -> ExtractionOutput {
    let mut output = ExtractionOutput::default();

    for outcome in outcomes {
        match outcome {
            BatchOutcome::Ok(text) => {
                if !text.is_empty() {
                    output.text.push_str(&text);
                    output.text.push_str("\n\n");
                }
            }
            BatchOutcome::Skipped { batch, reason } => {
                output.skipped.push(format!("batch {}: {}", batch, reason));
            }
        }
    }

    output
}
