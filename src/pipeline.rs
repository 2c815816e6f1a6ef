use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::{info, warn};

use crate::config::{AppConfig, OutputConfig};
use crate::core::error::SegmentError;
use crate::core::model::{OcrResponse, SectionBounds};
use crate::core::raster::SheetImage;
use crate::export::{CropExporter, Exporter, JsonExporter, MarkdownExporter, OverlayExporter};
use crate::layout::{extract_sections, LayoutAnalyzer};
use crate::ocr::{OcrRequest, OcrService};
use crate::sections::{build_section_info, SectionStore};

/// Everything produced from one sheet.
#[derive(Debug, Clone)]
pub struct ProcessedSheet {
    pub source: DynamicImage,
    pub crops: Vec<DynamicImage>,
    pub store: SectionStore,
    pub analyzed_at: DateTime<Local>,
}

impl ProcessedSheet {
    pub fn width(&self) -> u32 {
        self.source.width()
    }

    pub fn height(&self) -> u32 {
        self.source.height()
    }

    pub fn bounds(&self) -> Vec<SectionBounds> {
        self.store.iter().map(|s| s.bounds).collect()
    }
}

/// Progress after each OCR call: `(done, total)`.
pub type ProgressFn<'a> = dyn FnMut(usize, usize) + 'a;

/// Segments a sheet, runs OCR on every section in order and builds the
/// section records.
pub struct SheetProcessor<'a> {
    analyzer: LayoutAnalyzer,
    ocr: &'a dyn OcrService,
}

impl<'a> SheetProcessor<'a> {
    pub fn new(analyzer: LayoutAnalyzer, ocr: &'a dyn OcrService) -> Self {
        Self { analyzer, ocr }
    }

    pub fn from_config(config: &AppConfig, ocr: &'a dyn OcrService) -> Self {
        Self::new(LayoutAnalyzer::from_config(&config.segmentation), ocr)
    }

    pub fn analyzer(&self) -> &LayoutAnalyzer {
        &self.analyzer
    }

    /// OCR failures become failed section records. Errors returned here are
    /// problems with the sheet itself, such as a raster that cannot be cropped.
    pub fn process(
        &self,
        image: &SheetImage,
        on_progress: &mut ProgressFn<'_>,
    ) -> Result<ProcessedSheet, SegmentError> {
        let analyzed_at = Local::now();
        let bounds = self.analyzer.analyze(image);
        let source = image.to_dynamic()?;
        let crops = extract_sections(&source, &bounds)?;

        let total = bounds.len();
        let mut sections = Vec::with_capacity(total);
        for (index, (section_bounds, crop)) in bounds.iter().zip(&crops).enumerate() {
            let request = OcrRequest::png(format!("section_{}.png", index + 1), encode_png(crop)?);
            let response = self.recognize(&request);
            sections.push(build_section_info(index, *section_bounds, response));
            on_progress(index + 1, total);
        }

        info!(sections = total, "sheet processed");
        Ok(ProcessedSheet {
            source,
            crops,
            store: SectionStore::new(sections),
            analyzed_at,
        })
    }

    fn recognize(&self, request: &OcrRequest) -> OcrResponse {
        match self.ocr.recognize(request) {
            Ok(response) => {
                if !response.success {
                    warn!(
                        section = %request.name,
                        error = response.error.as_deref().unwrap_or("unknown"),
                        "OCR reported failure"
                    );
                }
                response
            }
            Err(err) => {
                warn!(section = %request.name, error = %err, "OCR call failed");
                OcrResponse::failed(format!("{err:#}"))
            }
        }
    }
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, SegmentError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(SegmentError::Encode)?;
    Ok(buffer.into_inner())
}

/// Writes the outputs enabled in `output` into `out_dir`.
pub fn export_sheet(sheet: &ProcessedSheet, out_dir: &Path, output: &OutputConfig) -> Result<()> {
    let dir: PathBuf = out_dir.to_path_buf();
    let mut exporters: Vec<Box<dyn Exporter>> = vec![
        Box::new(JsonExporter::new(dir.clone()).with_ocr_payload(output.include_ocr_payload)),
        Box::new(MarkdownExporter::new(dir.clone())),
    ];
    if output.write_crops {
        exporters.push(Box::new(CropExporter::new(dir.clone())));
    }
    if output.write_overlay {
        exporters.push(Box::new(OverlayExporter::new(dir)));
    }

    for exporter in &exporters {
        exporter.export(sheet)?;
    }
    Ok(())
}
