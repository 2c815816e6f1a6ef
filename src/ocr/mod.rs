//! OCR collaborator interface.

pub mod bridge;

pub use bridge::CommandOcr;

use anyhow::Result;

use crate::core::model::OcrResponse;

/// One encoded image handed to the OCR service.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrRequest {
    /// Display name, also used as the file name when the image is staged.
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl OcrRequest {
    pub fn png(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: "image/png".to_string(),
            bytes,
        }
    }
}

pub trait OcrService {
    /// A reply with `success: false` is a normal outcome. `Err` means the
    /// service could not be reached or answered garbage.
    fn recognize(&self, request: &OcrRequest) -> Result<OcrResponse>;
}

/// Stand-in used when no OCR program is configured. Every section comes back
/// as a failed recognition so layout output is still produced.
#[derive(Debug, Clone, Default)]
pub struct DisabledOcr;

impl OcrService for DisabledOcr {
    fn recognize(&self, _request: &OcrRequest) -> Result<OcrResponse> {
        Ok(OcrResponse::failed("OCR is not configured"))
    }
}
