use serde_json::json;
use uuid::Uuid;

use crate::{
    clients::asset_fetcher::AssetFetcherClient,
    error::ServiceError,
    services::processors::{CancellationCheck, ProcessorOutput, ProgressReporter},
};

/// JSON payloads are capped at this many extracted characters; anything
/// beyond is dropped and `truncated: true` is reported instead.
const MAX_TEXT_CHARS: usize = 100_000;

/// PDFs are OCRed page by page, bounded so a thousand-page scan doesn't tie
/// up a worker slot indefinitely.
const MAX_PDF_OCR_PAGES: i32 = 3;

/// A `Canceled` signal returned from the handler is distinguished from a hard
/// failure: the dispatcher marks the run canceled rather than retrying or
/// dead-lettering it.
pub enum OcrOutcome {
    Completed(ProcessorOutput),
    Canceled { partial_text: String, pages_done: i32, pages_total: i32 },
}

pub async fn run(
    client: &AssetFetcherClient,
    asset_id: Uuid,
    cancellation: &dyn CancellationCheck,
    progress: &dyn ProgressReporter,
) -> Result<OcrOutcome, ServiceError> {
    let metadata = client
        .fetch_metadata(asset_id)
        .await
        .map_err(ServiceError::Internal)?;
    let bytes = client
        .fetch_bytes(asset_id)
        .await
        .map_err(ServiceError::Internal)?;

    let content_type = sniff_content_type(metadata.content_type.as_deref(), &bytes);

    if content_type.starts_with("text/") {
        return run_text(&bytes, &content_type, cancellation, progress).await;
    }
    if is_supported_image_type(&content_type) {
        return run_image(&bytes, &content_type, cancellation, progress).await;
    }
    if content_type == "application/pdf" {
        return run_pdf(&bytes, cancellation, progress).await;
    }

    Err(ServiceError::Internal(anyhow::anyhow!(
        "OCR processor does not support content-type '{content_type}'"
    )))
}

/// Falls back to sniffing well-known magic bytes when the upstream metadata
/// omits a content type or reports the generic `application/octet-stream`.
fn sniff_content_type(reported: Option<&str>, bytes: &[u8]) -> String {
    let reported = reported.unwrap_or("").split(';').next().unwrap_or("").trim().to_lowercase();
    if !reported.is_empty() && reported != "application/octet-stream" {
        return reported;
    }
    if bytes.starts_with(b"%PDF-") {
        return "application/pdf".to_string();
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return "image/png".to_string();
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg".to_string();
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp".to_string();
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return "image/gif".to_string();
    }
    if reported.is_empty() {
        "application/octet-stream".to_string()
    } else {
        reported
    }
}

fn is_supported_image_type(content_type: &str) -> bool {
    matches!(
        content_type,
        "image/png" | "image/jpeg" | "image/jpg" | "image/gif" | "image/webp"
    )
}

async fn run_text(
    bytes: &[u8],
    content_type: &str,
    cancellation: &dyn CancellationCheck,
    progress: &dyn ProgressReporter,
) -> Result<OcrOutcome, ServiceError> {
    if cancellation.is_canceled().await? {
        return Ok(OcrOutcome::Canceled {
            partial_text: String::new(),
            pages_done: 0,
            pages_total: 1,
        });
    }

    let decoded = String::from_utf8(bytes.to_vec())
        .unwrap_or_else(|err| decode_latin1(err.as_bytes()));
    let (text, truncated) = truncate_chars(&decoded, MAX_TEXT_CHARS);

    progress
        .report(1, Some(1), Some("extracted page 1/1".to_string()))
        .await?;

    Ok(OcrOutcome::Completed(ProcessorOutput {
        data: json!({
            "text": text,
            "truncated": truncated,
            "content_type": content_type,
            "method": "http_text",
            "pages": 1,
        }),
        confidence: Some(1.0),
        ocr_text: Some(text),
    }))
}

/// Actual OCR of image content needs a tesseract-style engine, which isn't
/// part of the available dependency stack; this surfaces the same
/// dependency-missing failure the upstream service reports when its OCR
/// engine binary isn't installed, so the retry/dead-letter path classifies
/// and reports it the same way.
async fn run_image(
    bytes: &[u8],
    content_type: &str,
    cancellation: &dyn CancellationCheck,
    _progress: &dyn ProgressReporter,
) -> Result<OcrOutcome, ServiceError> {
    if cancellation.is_canceled().await? {
        return Ok(OcrOutcome::Canceled {
            partial_text: String::new(),
            pages_done: 0,
            pages_total: 1,
        });
    }

    image::load_from_memory(bytes).map_err(|err| {
        ServiceError::Internal(anyhow::anyhow!("content-type {content_type} is not a decodable image: {err}"))
    })?;

    Err(ServiceError::Internal(anyhow::anyhow!(
        "OCR engine dependency not installed for content-type {content_type}"
    )))
}

/// Embedded-text extraction by scanning uncompressed `Tj`/`TJ` text-showing
/// operators between `BT`/`ET` blocks. This only recovers text from PDFs
/// whose content streams aren't Flate-compressed; anything else falls back
/// to the same missing-dependency failure `run_image` reports, since
/// rasterizing a page for OCR needs a renderer this stack doesn't carry.
async fn run_pdf(
    bytes: &[u8],
    cancellation: &dyn CancellationCheck,
    progress: &dyn ProgressReporter,
) -> Result<OcrOutcome, ServiceError> {
    let page_bounds = split_pdf_pages(bytes);
    let pages_total = (page_bounds.len() as i32).min(MAX_PDF_OCR_PAGES).max(1);

    let mut extracted = String::new();
    for (idx, page_bytes) in page_bounds.iter().take(pages_total as usize).enumerate() {
        if cancellation.is_canceled().await? {
            return Ok(OcrOutcome::Canceled {
                partial_text: extracted,
                pages_done: idx as i32,
                pages_total,
            });
        }

        extracted.push_str(&extract_pdf_page_text(page_bytes));
        extracted.push('\n');

        progress
            .report(
                idx as i32 + 1,
                Some(pages_total),
                Some(format!("extracted page {}/{}", idx + 1, pages_total)),
            )
            .await?;
    }

    if extracted.trim().is_empty() {
        return Err(ServiceError::Internal(anyhow::anyhow!(
            "no embedded text found; rasterized OCR fallback requires a PDF rasterizer dependency not installed"
        )));
    }

    let (text, truncated) = truncate_chars(&extracted, MAX_TEXT_CHARS);
    Ok(OcrOutcome::Completed(ProcessorOutput {
        data: json!({
            "text": text,
            "truncated": truncated,
            "content_type": "application/pdf",
            "method": "pdf_embedded_text",
            "pages": pages_total,
        }),
        confidence: Some(0.9),
        ocr_text: Some(text),
    }))
}

/// Splits raw PDF bytes into per-page byte ranges by locating `/Type /Page`
/// object boundaries. A coarse approximation of real page parsing, good
/// enough to bound how much of the file each "page" of work scans.
fn split_pdf_pages(bytes: &[u8]) -> Vec<&[u8]> {
    let marker = b"/Type/Page";
    let marker_spaced = b"/Type /Page";
    let mut offsets = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(marker) || bytes[i..].starts_with(marker_spaced) {
            offsets.push(i);
            i += marker.len();
        } else {
            i += 1;
        }
    }
    if offsets.is_empty() {
        return vec![bytes];
    }
    let mut pages = Vec::new();
    for window in offsets.windows(2) {
        pages.push(&bytes[window[0]..window[1]]);
    }
    if let Some(&last) = offsets.last() {
        pages.push(&bytes[last..]);
    }
    pages
}

fn extract_pdf_page_text(page: &[u8]) -> String {
    let mut text = String::new();
    let mut in_block = false;
    let mut i = 0;
    while i < page.len() {
        if page[i..].starts_with(b"BT") {
            in_block = true;
            i += 2;
            continue;
        }
        if page[i..].starts_with(b"ET") {
            in_block = false;
            i += 2;
            continue;
        }
        if in_block && page[i] == b'(' {
            let mut j = i + 1;
            let mut literal = Vec::new();
            while j < page.len() && page[j] != b')' {
                if page[j] == b'\\' && j + 1 < page.len() {
                    j += 1;
                }
                literal.push(page[j]);
                j += 1;
            }
            text.push_str(&String::from_utf8_lossy(&literal));
            text.push(' ');
            i = j + 1;
            continue;
        }
        i += 1;
    }
    text
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    if text.chars().count() <= max_chars {
        (text.to_string(), false)
    } else {
        (text.chars().take(max_chars).collect(), true)
    }
}
