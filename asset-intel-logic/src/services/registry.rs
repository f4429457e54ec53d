use crate::error::ServiceError;

/// Static description of a processor the dispatcher can run. Handlers are
/// looked up by name rather than held as function pointers here so the
/// registry stays a plain data table; `dispatcher::dispatch` matches on
/// `name` to pick the implementation in `services::processors`.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorSpec {
    pub name: &'static str,
    pub version: &'static str,
    pub price_cents: i32,
    pub supports_cancel: bool,
    pub max_tries: i32,
}

/// Prices are frozen from the billing configuration; `image-metadata` and
/// `asset-fingerprint` carry over their original cent amounts, `ocr-text` is
/// new here and priced above `image-metadata` to reflect its higher compute
/// cost (see DESIGN.md).
pub const PROCESSORS: &[ProcessorSpec] = &[
    ProcessorSpec {
        name: "asset-fingerprint",
        version: "1",
        price_cents: 50,
        supports_cancel: false,
        max_tries: 3,
    },
    ProcessorSpec {
        name: "image-metadata",
        version: "1",
        price_cents: 100,
        supports_cancel: false,
        max_tries: 3,
    },
    ProcessorSpec {
        name: "ocr-text",
        version: "1",
        price_cents: 150,
        supports_cancel: true,
        max_tries: 3,
    },
];

pub fn find(name: &str) -> Result<&'static ProcessorSpec, ServiceError> {
    PROCESSORS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ServiceError::BadRequest(format!("unknown processor: {name}")))
}

/// `fingerprint` runs ahead of, and can cascade-cancel, `ocr-text` for the
/// same asset -- the inverse never holds.
pub fn cascades_to(name: &str) -> &'static [&'static str] {
    match name {
        "asset-fingerprint" => &["ocr-text"],
        _ => &[],
    }
}
