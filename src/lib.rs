pub mod assist;
pub mod config;
pub mod core;
pub mod detect;
pub mod export;
pub mod fusion;
pub mod layout;
pub mod ocr;
pub mod pipeline;
pub mod report;
pub mod sections;

pub use core::category::{classify_section_content, Category};
pub use core::model::{SectionBounds, SectionInfo};
pub use core::raster::SheetImage;
pub use layout::{extract_sections, LayoutAnalyzer};
pub use pipeline::{ProcessedSheet, SheetProcessor};
