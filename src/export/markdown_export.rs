use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::confidence::is_low_trust;
use crate::export::Exporter;
use crate::pipeline::ProcessedSheet;

pub const SUMMARY_FILE: &str = "summary.md";

/// Per-category statistics and section details of one sheet.
#[derive(Debug, Clone)]
pub struct MarkdownExporter {
    out_dir: PathBuf,
}

impl MarkdownExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn render(&self, sheet: &ProcessedSheet) -> String {
        if sheet.store.is_empty() {
            return "# エラー\n\nレポート生成対象のデータがありません。\n".to_string();
        }

        let mut out = String::from("# 改善提案シート 複数セクション分析レポート\n\n");
        out.push_str("## 処理概要\n");
        out.push_str(&format!(
            "- **処理日時:** {}\n",
            sheet.analyzed_at.format("%Y年%m月%d日 %H:%M:%S")
        ));
        out.push_str(&format!("- **総セクション数:** {}\n", sheet.store.len()));
        out.push_str(&format!(
            "- **画像サイズ:** {} x {}\n",
            sheet.width(),
            sheet.height()
        ));
        let fallback = sheet.store.iter().any(|s| is_low_trust(s.bounds.confidence));
        out.push_str(if fallback {
            "- **分割方法:** 均等分割（レイアウト解析に失敗）\n\n"
        } else {
            "- **分割方法:** 罫線・文字密度による自動検出\n\n"
        });

        out.push_str("## カテゴリ別統計\n");
        for entry in sheet.store.category_summary() {
            out.push_str(&format!(
                "- **{}:** {}件 ({:.1}%)\n",
                entry.category, entry.count, entry.percentage
            ));
        }

        out.push_str("\n## セクション詳細\n\n");
        for section in sheet.store.iter() {
            out.push_str(&format!(
                "### セクション {}: {}\n\n",
                section.id, section.category
            ));
            if section.content.is_empty() {
                out.push_str("**内容:** （検出されませんでした）\n\n");
            } else {
                out.push_str(&format!("**内容:**\n{}\n\n", section.content));
            }
            out.push_str("---\n\n");
        }

        out
    }
}

impl Exporter for MarkdownExporter {
    fn export(&self, sheet: &ProcessedSheet) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(SUMMARY_FILE);
        fs::write(&path, self.render(sheet))
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
