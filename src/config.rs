//! Application configuration stored as TOML.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::detect::morphology::MAX_KERNEL_WIDTH;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub segmentation: SegmentationConfig,
    pub ocr: OcrConfig,
    pub assist: AssistConfig,
    pub output: OutputConfig,
}

/// Layout analysis tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Width of the horizontal structuring element
    pub line_kernel_width: u32,
    /// Share of a row that must be ruled line (0-1]
    pub line_threshold: f64,
    /// Flagged rows closer than this collapse into one line
    pub line_group_gap: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Density change threshold in standard deviations
    pub density_sigma: f64,
    pub min_section_height: u32,
    /// Cuts closer than this are merged into one boundary
    pub snap_tolerance: u32,
    /// Band count of the blind split used when analysis fails
    pub fallback_sections: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            line_kernel_width: 40,
            line_threshold: 0.7,
            line_group_gap: 5,
            canny_low: 50.0,
            canny_high: 150.0,
            density_sigma: 2.0,
            min_section_height: 50,
            snap_tolerance: 10,
            fallback_sections: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    /// Program invoked once per section; none disables OCR
    pub command: Option<String>,
    /// Extra arguments placed before `--image`
    pub args: Vec<String>,
    /// Where section crops are written for the OCR program
    pub work_dir: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            work_dir: PathBuf::from("work/ocr"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssistConfig {
    /// Program answering correction, clustering and report tasks
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Try the assistant before the built-in report formatter
    pub ai_report: bool,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            ai_report: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub write_crops: bool,
    pub write_overlay: bool,
    /// Keep the raw OCR payload of each section in sections.json
    pub include_ocr_payload: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            write_crops: true,
            write_overlay: true,
            include_ocr_payload: false,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        let seg = &self.segmentation;
        ensure!(
            seg.line_threshold > 0.0 && seg.line_threshold <= 1.0,
            "segmentation.line_threshold must be in (0, 1], got {}",
            seg.line_threshold
        );
        ensure!(
            (1..=MAX_KERNEL_WIDTH).contains(&seg.line_kernel_width),
            "segmentation.line_kernel_width must be in 1..={MAX_KERNEL_WIDTH}, got {}",
            seg.line_kernel_width
        );
        ensure!(
            seg.min_section_height > 0,
            "segmentation.min_section_height must be positive"
        );
        ensure!(
            seg.snap_tolerance < seg.min_section_height,
            "segmentation.snap_tolerance ({}) must be below min_section_height ({})",
            seg.snap_tolerance,
            seg.min_section_height
        );
        ensure!(
            seg.canny_low <= seg.canny_high,
            "segmentation.canny_low must not exceed canny_high"
        );
        ensure!(
            seg.fallback_sections > 0,
            "segmentation.fallback_sections must be positive"
        );
        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    Ok(())
}
