use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::core::category::Category;
use crate::core::model::{OcrResponse, SectionBounds, SectionInfo, SectionType};
use crate::sections::SectionStore;

/// Bounds as written to the bundle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BundleBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

impl From<&SectionBounds> for BundleBounds {
    fn from(b: &SectionBounds) -> Self {
        Self {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
            confidence: b.confidence,
        }
    }
}

impl From<BundleBounds> for SectionBounds {
    fn from(b: BundleBounds) -> Self {
        Self {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
            section_type: SectionType::Content,
            confidence: b.confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleSection {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub content: String,
    pub bounds: BundleBounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_result: Option<OcrResponse>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingSummary {
    pub total_sections: usize,
    pub categories: Vec<Category>,
    pub success_rate: f64,
}

/// Exported result set of one processed sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionBundle {
    pub total_sections: usize,
    pub analysis_timestamp: DateTime<FixedOffset>,
    pub sections: Vec<BundleSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_info: Option<ImageInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_summary: Option<ProcessingSummary>,
}

impl SectionBundle {
    pub fn from_sections(
        sections: &[SectionInfo],
        analysis_timestamp: DateTime<FixedOffset>,
        include_ocr: bool,
    ) -> Self {
        let sections = sections
            .iter()
            .map(|s| BundleSection {
                id: s.id.clone(),
                title: s.title.clone(),
                category: s.category,
                content: s.content.clone(),
                bounds: BundleBounds::from(&s.bounds),
                ocr_result: s.ocr_result.clone().filter(|_| include_ocr),
            })
            .collect::<Vec<_>>();

        Self {
            total_sections: sections.len(),
            analysis_timestamp,
            sections,
            image_info: None,
            processing_summary: None,
        }
    }

    pub fn with_image_info(mut self, width: u32, height: u32) -> Self {
        self.image_info = Some(ImageInfo { width, height });
        self
    }

    pub fn with_summary(mut self, store: &SectionStore) -> Self {
        self.processing_summary = Some(ProcessingSummary {
            total_sections: store.len(),
            categories: store.categories(),
            success_rate: store.success_rate(),
        });
        self
    }

    /// Records as they were exported, in bundle order.
    pub fn to_sections(&self) -> Vec<SectionInfo> {
        self.sections
            .iter()
            .map(|s| SectionInfo {
                id: s.id.clone(),
                bounds: s.bounds.into(),
                title: s.title.clone(),
                content: s.content.clone(),
                category: s.category,
                ocr_result: s.ocr_result.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Band;
    use crate::sections::build_section_info;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn timestamp() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .and_then(|tz| tz.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).single())
            .expect("valid timestamp")
    }

    fn sections() -> Vec<SectionInfo> {
        vec![
            build_section_info(
                0,
                SectionBounds::from_band(Band::new(0, 400), 1200, 0.8),
                OcrResponse::with_text("交通の問題"),
            ),
            build_section_info(
                1,
                SectionBounds::from_band(Band::new(400, 1600), 1200, 0.8),
                OcrResponse::failed("timeout"),
            ),
        ]
    }

    #[test]
    fn writes_expected_shape() -> anyhow::Result<()> {
        let store = SectionStore::new(sections());
        let bundle = SectionBundle::from_sections(store.as_slice(), timestamp(), false)
            .with_image_info(1200, 1600)
            .with_summary(&store);
        let value = serde_json::to_value(&bundle)?;

        assert_eq!(value["total_sections"], 2);
        assert_eq!(value["analysis_timestamp"], "2024-05-01T09:30:00+09:00");
        assert_eq!(value["sections"][0]["category"], "課題");
        assert_eq!(value["sections"][1]["category"], "その他");
        assert_eq!(value["sections"][1]["bounds"]["height"], 1200);
        assert!(value["sections"][0].get("ocr_result").is_none());
        assert!(value["sections"][0]["bounds"].get("section_type").is_none());
        assert_eq!(value["image_info"]["width"], 1200);
        assert_eq!(
            value["processing_summary"]["categories"],
            serde_json::json!(["課題", "その他"])
        );
        assert_eq!(value["processing_summary"]["success_rate"], 0.5);
        Ok(())
    }

    #[test]
    fn reading_back_keeps_order_categories_and_bounds() -> anyhow::Result<()> {
        let original = sections();
        let json = serde_json::to_string_pretty(&SectionBundle::from_sections(
            &original,
            timestamp(),
            false,
        ))?;

        let reread: SectionBundle = serde_json::from_str(&json)?;
        let restored = reread.to_sections();

        let ids: Vec<&str> = restored.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        for (before, after) in original.iter().zip(&restored) {
            assert_eq!(before.category, after.category);
            assert_eq!(before.bounds, after.bounds);
            assert_eq!(before.title, after.title);
        }
        assert_eq!(reread.analysis_timestamp, timestamp());
        Ok(())
    }

    #[test]
    fn legacy_unknown_label_reads_as_other() -> anyhow::Result<()> {
        let json = r#"{
            "total_sections": 1,
            "analysis_timestamp": "2024-05-01T00:00:00Z",
            "sections": [{
                "id": "1", "title": "t", "category": "unknown", "content": "",
                "bounds": {"x": 0, "y": 0, "width": 10, "height": 10, "confidence": 0.5}
            }]
        }"#;
        let bundle: SectionBundle = serde_json::from_str(json)?;
        assert_eq!(bundle.sections[0].category, Category::Other);
        let value: Value = serde_json::to_value(&bundle)?;
        assert_eq!(value["sections"][0]["category"], "その他");
        Ok(())
    }
}
