pub mod fingerprint;
pub mod image_metadata;
pub mod ocr_text;

use serde_json::Value;

use crate::error::ServiceError;

/// What a processor handler hands back to the dispatcher: the JSON payload
/// to persist as a `results` row, a confidence score when the processor has
/// one, and extracted OCR text when applicable (used to populate the search
/// index's `ocr_text_preview`, independent of whether the result itself
/// stores the full text).
pub struct ProcessorOutput {
    pub data: Value,
    pub confidence: Option<f64>,
    pub ocr_text: Option<String>,
}

/// Polled by long-running handlers (OCR) between pages/chunks of work so a
/// cancellation request takes effect without waiting for the whole job.
#[async_trait::async_trait]
pub trait CancellationCheck: Send + Sync {
    async fn is_canceled(&self) -> Result<bool, ServiceError>;
}

/// Lets a handler persist incremental progress (e.g. "page 3 of 12") as it
/// works, rather than only reporting at completion.
#[async_trait::async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(
        &self,
        current: i32,
        total: Option<i32>,
        message: Option<String>,
    ) -> Result<(), ServiceError>;
}
