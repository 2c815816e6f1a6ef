//! Per-section records and the session store that owns them.

pub mod store;

pub use store::{CategoryCount, SectionEdit, SectionStore, StoreError};

use tracing::debug;

use crate::core::category::classify_section_content;
use crate::core::model::{section_title, OcrResponse, SectionBounds, SectionInfo};

/// Builds the record for section `index` (zero-based) from its OCR result.
///
/// A failed OCR result still produces a record, with empty content and the
/// catch-all category, so a human can fill it in later.
pub fn build_section_info(index: usize, bounds: SectionBounds, ocr: OcrResponse) -> SectionInfo {
    let id = (index + 1).to_string();
    let content = ocr.best_text().to_string();
    let category = classify_section_content(&content);
    debug!(section = %id, %category, chars = content.chars().count(), "section classified");

    SectionInfo {
        title: section_title(&id, category),
        id,
        bounds,
        content,
        category,
        ocr_result: Some(ocr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::category::Category;
    use crate::core::geometry::Band;
    use pretty_assertions::assert_eq;

    fn bounds() -> SectionBounds {
        SectionBounds::from_band(Band::new(0, 400), 1200, 0.8)
    }

    #[test]
    fn classifies_recognized_text() {
        let info = build_section_info(0, bounds(), OcrResponse::with_text("地域の課題は交通の問題です"));
        assert_eq!(info.id, "1");
        assert_eq!(info.category, Category::Issue);
        assert_eq!(info.title, "セクション 1 (課題)");
        assert_eq!(info.content, "地域の課題は交通の問題です");
        assert!(info.ocr_result.is_some());
    }

    #[test]
    fn failed_ocr_is_kept_as_empty_other() {
        let info = build_section_info(2, bounds(), OcrResponse::failed("timeout"));
        assert_eq!(info.id, "3");
        assert_eq!(info.content, "");
        assert_eq!(info.category, Category::Other);
        assert_eq!(info.title, "セクション 3 (その他)");
        assert_eq!(
            info.ocr_result.and_then(|r| r.error).as_deref(),
            Some("timeout")
        );
    }
}
