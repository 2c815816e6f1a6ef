pub mod bundle;
pub mod crop_export;
pub mod json_export;
pub mod markdown_export;
pub mod overlay_export;

use anyhow::Result;

use crate::pipeline::ProcessedSheet;

pub use bundle::SectionBundle;
pub use crop_export::CropExporter;
pub use json_export::{read_bundle, JsonExporter};
pub use markdown_export::MarkdownExporter;
pub use overlay_export::OverlayExporter;

pub trait Exporter {
    fn export(&self, sheet: &ProcessedSheet) -> Result<()>;
}
