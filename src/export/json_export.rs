use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::export::bundle::SectionBundle;
use crate::export::Exporter;
use crate::pipeline::ProcessedSheet;

pub const BUNDLE_FILE: &str = "sections.json";

#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
    include_ocr_payload: bool,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            include_ocr_payload: false,
        }
    }

    pub fn with_ocr_payload(mut self, include: bool) -> Self {
        self.include_ocr_payload = include;
        self
    }

    pub fn bundle(&self, sheet: &ProcessedSheet) -> SectionBundle {
        SectionBundle::from_sections(
            sheet.store.as_slice(),
            sheet.analyzed_at.fixed_offset(),
            self.include_ocr_payload,
        )
        .with_image_info(sheet.width(), sheet.height())
        .with_summary(&sheet.store)
    }
}

impl Exporter for JsonExporter {
    fn export(&self, sheet: &ProcessedSheet) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(BUNDLE_FILE);
        let data = serde_json::to_string_pretty(&self.bundle(sheet))?;
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

pub fn read_bundle(path: &Path) -> Result<SectionBundle> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let bundle = serde_json::from_str(&data)
        .with_context(|| format!("{} is not a section bundle", path.display()))?;
    Ok(bundle)
}
