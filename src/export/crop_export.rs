use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::export::Exporter;
use crate::pipeline::ProcessedSheet;

/// Writes every section crop as `sections/section_{id}.png`.
#[derive(Debug, Clone)]
pub struct CropExporter {
    out_dir: PathBuf,
}

impl CropExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for CropExporter {
    fn export(&self, sheet: &ProcessedSheet) -> Result<()> {
        let dir = self.out_dir.join("sections");
        fs::create_dir_all(&dir)?;

        for (section, crop) in sheet.store.iter().zip(&sheet.crops) {
            let path = dir.join(format!("section_{}.png", section.id));
            crop.save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(())
    }
}
