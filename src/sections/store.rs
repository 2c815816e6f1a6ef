use serde::Serialize;
use thiserror::Error;

use crate::core::category::{classify_section_content, Category};
use crate::core::model::{section_title, SectionInfo};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no section with id {0}")]
    UnknownSection(String),
}

/// Edit applied to one section of the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionEdit {
    SetContent(String),
    /// Also regenerates the title.
    SetCategory(Category),
    SetTitle(String),
    /// Runs the keyword classifier again on the current content.
    Reclassify,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
    pub percentage: f64,
}

/// Sections of one processing session, in sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionStore {
    sections: Vec<SectionInfo>,
}

impl SectionStore {
    pub fn new(sections: Vec<SectionInfo>) -> Self {
        Self { sections }
    }

    pub fn get(&self, id: &str) -> Option<&SectionInfo> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionInfo> {
        self.sections.iter()
    }

    pub fn as_slice(&self) -> &[SectionInfo] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn reset(&mut self) {
        self.sections.clear();
    }

    pub fn apply(&mut self, id: &str, edit: SectionEdit) -> Result<&SectionInfo, StoreError> {
        let section = self
            .sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::UnknownSection(id.to_string()))?;

        match edit {
            SectionEdit::SetContent(content) => section.content = content,
            SectionEdit::SetCategory(category) => {
                section.category = category;
                section.title = section_title(&section.id, category);
            }
            SectionEdit::SetTitle(title) => section.title = title,
            SectionEdit::Reclassify => {
                section.category = classify_section_content(&section.content);
                section.title = section_title(&section.id, section.category);
            }
        }
        Ok(section)
    }

    /// Section count per category, in order of first appearance.
    pub fn category_summary(&self) -> Vec<CategoryCount> {
        let mut counts: Vec<(Category, usize)> = Vec::new();
        for section in &self.sections {
            match counts.iter_mut().find(|(c, _)| *c == section.category) {
                Some((_, count)) => *count += 1,
                None => counts.push((section.category, 1)),
            }
        }

        let total = self.sections.len() as f64;
        counts
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category,
                count,
                percentage: count as f64 / total * 100.0,
            })
            .collect()
    }

    /// Distinct categories in order of first appearance.
    pub fn categories(&self) -> Vec<Category> {
        self.category_summary()
            .into_iter()
            .map(|entry| entry.category)
            .collect()
    }

    /// Share of sections with recognized content, 0 for an empty store.
    pub fn success_rate(&self) -> f64 {
        if self.sections.is_empty() {
            return 0.0;
        }
        let filled = self.sections.iter().filter(|s| !s.content.is_empty()).count();
        filled as f64 / self.sections.len() as f64
    }

    pub fn filter_by_categories(&self, categories: &[Category]) -> Vec<&SectionInfo> {
        self.sections
            .iter()
            .filter(|s| categories.contains(&s.category))
            .collect()
    }

    pub fn into_sections(self) -> Vec<SectionInfo> {
        self.sections
    }
}
