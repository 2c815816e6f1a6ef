use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::category::Category;
use crate::core::geometry::Band;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Header,
    #[default]
    Content,
    Example,
}

/// Rectangular region of the source sheet. Always a full-width horizontal band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SectionBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub section_type: SectionType,
    pub confidence: f32,
}

impl SectionBounds {
    pub fn from_band(band: Band, image_width: u32, confidence: f32) -> Self {
        Self {
            x: 0,
            y: band.start,
            width: image_width,
            height: band.height(),
            section_type: SectionType::Content,
            confidence,
        }
    }

    pub fn band(&self) -> Band {
        Band::new(self.y, self.bottom())
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|right| right <= image_width)
            && self.y.checked_add(self.height).is_some_and(|bottom| bottom <= image_height)
    }
}

/// Response of the OCR collaborator. Only `success` and `error` have a fixed
/// shape; everything else is backend-specific and kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OcrResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl OcrResponse {
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("text".to_string(), Value::String(text.into()));
        Self {
            success: true,
            error: None,
            payload,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("text".to_string(), Value::String(String::new()));
        payload.insert("source".to_string(), Value::String("error".to_string()));
        Self {
            success: false,
            error: Some(error.into()),
            payload,
        }
    }

    /// Recognized text: `text`, then `extracted_text`, then nothing.
    pub fn best_text(&self) -> &str {
        if !self.success {
            return "";
        }
        ["text", "extracted_text"]
            .iter()
            .find_map(|key| self.payload.get(*key).and_then(Value::as_str))
            .unwrap_or("")
    }
}

/// One section of a processed sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionInfo {
    pub id: String,
    pub bounds: SectionBounds,
    pub title: String,
    pub content: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_result: Option<OcrResponse>,
}

pub fn section_title(id: &str, category: Category) -> String {
    format!("セクション {id} ({})", category.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bounds_follow_band() {
        let bounds = SectionBounds::from_band(Band::new(400, 900), 1200, 0.8);
        assert_eq!(bounds.x, 0);
        assert_eq!(bounds.y, 400);
        assert_eq!(bounds.height, 500);
        assert_eq!(bounds.band(), Band::new(400, 900));
        assert!(bounds.fits_within(1200, 900));
        assert!(!bounds.fits_within(1200, 899));
    }

    #[test]
    fn prefers_text_over_extracted_text() {
        let response: OcrResponse = serde_json::from_str(
            r#"{"success": true, "text": "primary", "extracted_text": "secondary"}"#,
        )
        .expect("valid json");
        assert_eq!(response.best_text(), "primary");

        let response: OcrResponse =
            serde_json::from_str(r#"{"success": true, "extracted_text": "secondary"}"#)
                .expect("valid json");
        assert_eq!(response.best_text(), "secondary");
    }

    #[test]
    fn failed_response_has_no_text() {
        let response: OcrResponse =
            serde_json::from_str(r#"{"success": false, "text": "stale", "error": "timeout"}"#)
                .expect("valid json");
        assert_eq!(response.best_text(), "");
        assert_eq!(OcrResponse::failed("boom").best_text(), "");
    }

    #[test]
    fn non_string_text_falls_through() {
        let response: OcrResponse = serde_json::from_str(
            r#"{"success": true, "text": {"pages": []}, "extracted_text": "flat"}"#,
        )
        .expect("valid json");
        assert_eq!(response.best_text(), "flat");
    }

    #[test]
    fn builds_title() {
        assert_eq!(section_title("2", Category::Effect), "セクション 2 (効果)");
    }
}
