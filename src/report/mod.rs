//! Markdown report of issue clusters.
//!
//! The assistant drafts the report when available. The built-in formatter is
//! deterministic and is used whenever the assistant is disabled or fails.

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::assist::{AssistTask, Assistant};

const REPORT_TITLE: &str = "# 地域課題と解決策の整理結果";
const EMPTY_MARKER: &str = "（該当なし）";

/// Solution fields and their headings, in report order.
const SECTIONS: [(&str, &str); 4] = [
    ("personal", "個人としてできること"),
    ("community", "地域としてできること"),
    ("gov", "行政の役割"),
    ("others", "その他"),
];

pub trait ReportRenderer {
    fn render(&self, clusters: &[Value]) -> Result<String>;
}

/// Report drafted by the assistant from the pretty-printed clusters.
pub struct AssistantRenderer<'a> {
    assistant: &'a dyn Assistant,
}

impl<'a> AssistantRenderer<'a> {
    pub fn new(assistant: &'a dyn Assistant) -> Self {
        Self { assistant }
    }
}

impl ReportRenderer for AssistantRenderer<'_> {
    fn render(&self, clusters: &[Value]) -> Result<String> {
        let payload = serde_json::to_string_pretty(clusters)?;
        self.assistant.complete(AssistTask::Markdown, &payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMethod {
    Ai,
    Manual,
    ManualFallback,
}

impl fmt::Display for ReportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportMethod::Ai => "ai",
            ReportMethod::Manual => "manual",
            ReportMethod::ManualFallback => "manual_fallback",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedReport {
    pub markdown: String,
    pub method: ReportMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_error: Option<String>,
}

/// Never fails: an assistant error falls back to [`format_manually`].
pub fn render_report(renderer: Option<&dyn ReportRenderer>, clusters: &[Value]) -> RenderedReport {
    let Some(renderer) = renderer else {
        return RenderedReport {
            markdown: format_manually(clusters),
            method: ReportMethod::Manual,
            ai_error: None,
        };
    };

    match renderer.render(clusters) {
        Ok(markdown) => RenderedReport {
            markdown,
            method: ReportMethod::Ai,
            ai_error: None,
        },
        Err(err) => {
            warn!(error = %err, "AI report failed, using the built-in formatter");
            RenderedReport {
                markdown: format_manually(clusters),
                method: ReportMethod::ManualFallback,
                ai_error: Some(format!("{err:#}")),
            }
        }
    }
}

/// List items of one solution field: array entries or non-empty lines.
fn field_items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn format_manually(clusters: &[Value]) -> String {
    let mut lines = vec![format!("{REPORT_TITLE}\n")];

    for (i, cluster) in clusters.iter().enumerate() {
        let title = match cluster.get("problem").and_then(Value::as_str) {
            Some(problem) if !problem.trim().is_empty() => problem.trim().to_string(),
            _ => format!("課題 {}", i + 1),
        };
        lines.push(format!("## {title}\n"));

        for (field, heading) in SECTIONS {
            lines.push(format!("### {heading}\n"));
            let items = field_items(cluster.get(field));
            if items.is_empty() {
                lines.push(format!("{EMPTY_MARKER}\n"));
            } else {
                lines.extend(items.into_iter().map(|item| format!("- {item}")));
                lines.push(String::new());
            }
        }

        lines.push("---\n".to_string());
    }

    lines.join("\n")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportMetadata {
    pub timestamp: DateTime<Local>,
    pub image_count: usize,
    pub problem_count: usize,
}

/// Prepends the processing-info block.
pub fn with_metadata(markdown: &str, metadata: &ReportMetadata) -> String {
    let header = [
        "---".to_string(),
        "# 処理情報".to_string(),
        format!(
            "- 処理日時: {}",
            metadata.timestamp.format("%Y-%m-%d %H:%M:%S")
        ),
        format!("- 処理画像数: {}", metadata.image_count),
        format!("- 識別された課題数: {}", metadata.problem_count),
        "---\n".to_string(),
    ];
    format!("{}\n{markdown}", header.join("\n"))
}
