use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::assist::correct::{correct_all, successful_records};
use crate::assist::reply::{parse_reply, CollaboratorError};
use crate::assist::{AssistTask, Assistant};
use crate::core::model::{OcrResponse, SectionInfo};

/// Fields every issue cluster must carry.
pub const CLUSTER_FIELDS: [&str; 5] = ["problem", "personal", "community", "gov", "others"];

/// Fields that hold proposed solutions.
pub const SOLUTION_FIELDS: [&str; 4] = ["personal", "community", "gov", "others"];

/// Numbered `[imageN]` blocks, one per record, separated by blank lines.
pub fn organizer_input(records: &[Value]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let body = serde_json::to_string_pretty(record).unwrap_or_else(|_| record.to_string());
            format!("[image{}]\n{body}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Groups corrected records by underlying issue.
pub fn organize(assistant: &dyn Assistant, records: &[Value]) -> Result<Value, CollaboratorError> {
    let input = organizer_input(records);
    info!(records = records.len(), "organizing records by issue");
    let reply = assistant
        .complete(AssistTask::Organize, &input)
        .map_err(|err| CollaboratorError::Failed(format!("{err:#}")))?;
    parse_reply(&reply)
}

/// Recognition to correct for a stored section. The current content is used so
/// manual edits are carried; an empty section counts as a failed recognition.
pub fn section_recognition(section: &SectionInfo) -> OcrResponse {
    if section.content.trim().is_empty() {
        OcrResponse::failed(format!("section {} has no text", section.id))
    } else {
        OcrResponse::with_text(section.content.clone())
    }
}

/// Corrects every section that has text, then groups the corrected records
/// by issue.
pub fn organize_sections(
    assistant: &dyn Assistant,
    sections: &[SectionInfo],
    references: &[String],
) -> Result<Value, CollaboratorError> {
    let recognitions: Vec<OcrResponse> = sections.iter().map(section_recognition).collect();
    let corrections = correct_all(assistant, &recognitions, references);
    let records = successful_records(&corrections);
    info!(
        sections = sections.len(),
        corrected = records.len(),
        "sections corrected"
    );
    if records.is_empty() {
        return Err(CollaboratorError::Failed(
            "no section could be corrected".to_string(),
        ));
    }
    organize(assistant, &records)
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ClusterValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub total_problems: usize,
    pub problems_with_solutions: usize,
    /// `problem N: field` for every empty solution field.
    pub empty_fields: Vec<String>,
}

fn has_content(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::String(s)) => !s.trim().is_empty(),
        _ => false,
    }
}

pub fn validate_clusters(clusters: &Value) -> ClusterValidation {
    let Some(items) = clusters.as_array() else {
        return ClusterValidation {
            is_valid: false,
            issues: vec!["clusters are not a list".to_string()],
            ..ClusterValidation::default()
        };
    };

    let mut report = ClusterValidation {
        is_valid: true,
        total_problems: items.len(),
        ..ClusterValidation::default()
    };

    for (i, item) in items.iter().enumerate() {
        let number = i + 1;
        let missing: Vec<&str> = CLUSTER_FIELDS
            .iter()
            .copied()
            .filter(|field| item.get(field).is_none())
            .collect();
        if !missing.is_empty() {
            report.is_valid = false;
            report
                .issues
                .push(format!("problem {number}: missing fields {}", missing.join(", ")));
        }

        if SOLUTION_FIELDS.iter().any(|field| has_content(item.get(field))) {
            report.problems_with_solutions += 1;
        }
        for field in SOLUTION_FIELDS {
            if !has_content(item.get(field)) {
                report.empty_fields.push(format!("problem {number}: {field}"));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Band;
    use crate::core::model::SectionBounds;
    use crate::sections::build_section_info;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;

    struct Echo(&'static str);

    impl Assistant for Echo {
        fn complete(&self, task: AssistTask, _payload: &str) -> anyhow::Result<String> {
            assert_eq!(task, AssistTask::Organize);
            Ok(self.0.to_string())
        }
    }

    struct Down;

    impl Assistant for Down {
        fn complete(&self, _task: AssistTask, _payload: &str) -> anyhow::Result<String> {
            anyhow::bail!("service unavailable")
        }
    }

    /// Returns each corrected text as a record and a fixed cluster list.
    struct ByTask {
        organize_payloads: RefCell<Vec<String>>,
    }

    impl Assistant for ByTask {
        fn complete(&self, task: AssistTask, payload: &str) -> anyhow::Result<String> {
            match task {
                AssistTask::Correct => {
                    let request: Value = serde_json::from_str(payload)?;
                    Ok(json!({ "text": request["input"]["text"] }).to_string())
                }
                AssistTask::Organize => {
                    self.organize_payloads.borrow_mut().push(payload.to_string());
                    Ok(r#"[{"problem": "空き家", "personal": [], "community": ["見回り"], "gov": [], "others": []}]"#.to_string())
                }
                AssistTask::Markdown => anyhow::bail!("unexpected task"),
            }
        }
    }

    fn section(index: usize, content: &str) -> SectionInfo {
        let response = if content.is_empty() {
            OcrResponse::failed("empty")
        } else {
            OcrResponse::with_text(content)
        };
        build_section_info(
            index,
            SectionBounds::from_band(Band::new(0, 100), 100, 0.8),
            response,
        )
    }

    #[test]
    fn organizes_sections_with_text() -> anyhow::Result<()> {
        let assistant = ByTask {
            organize_payloads: RefCell::new(Vec::new()),
        };
        let sections = vec![
            section(0, "空き家が多い"),
            section(1, ""),
            section(2, "自治会で見回り"),
        ];

        let clusters = organize_sections(&assistant, &sections, &[])?;
        assert_eq!(clusters[0]["problem"], "空き家");

        let payloads = assistant.organize_payloads.borrow();
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].contains("[image1]") && payloads[0].contains("[image2]"));
        assert!(!payloads[0].contains("[image3]"));
        assert!(payloads[0].contains("自治会で見回り"));
        Ok(())
    }

    #[test]
    fn nothing_to_organize_is_an_error() {
        let assistant = ByTask {
            organize_payloads: RefCell::new(Vec::new()),
        };
        let result = organize_sections(&assistant, &[section(0, "")], &[]);
        assert!(matches!(result, Err(CollaboratorError::Failed(_))));
        assert!(assistant.organize_payloads.borrow().is_empty());
    }

    #[test]
    fn numbers_records() {
        let input = organizer_input(&[json!({"a": 1}), json!("b")]);
        assert_eq!(input, "[image1]\n{\n  \"a\": 1\n}\n\n[image2]\n\"b\"");
        assert_eq!(organizer_input(&[]), "");
    }

    #[test]
    fn organize_parses_or_reports() {
        let clusters = organize(&Echo("```json\n[{\"problem\": \"p\"}]\n```"), &[json!({})])
            .expect("valid reply");
        assert_eq!(clusters, json!([{"problem": "p"}]));

        assert!(matches!(
            organize(&Echo("sorry, I cannot"), &[]),
            Err(CollaboratorError::MalformedJson { .. })
        ));
        match organize(&Down, &[]) {
            Err(CollaboratorError::Failed(message)) => assert_eq!(message, "service unavailable"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn validates_cluster_shape() {
        let clusters = json!([
            {"problem": "ごみ", "personal": ["分別"], "community": "", "gov": [], "others": "  "},
            {"problem": "交通", "personal": []}
        ]);
        let report = validate_clusters(&clusters);

        assert!(!report.is_valid);
        assert_eq!(report.total_problems, 2);
        assert_eq!(report.problems_with_solutions, 1);
        assert_eq!(
            report.issues,
            vec!["problem 2: missing fields community, gov, others".to_string()]
        );
        assert_eq!(report.empty_fields.len(), 7);
        assert_eq!(report.empty_fields[0], "problem 1: community");
    }

    #[test]
    fn non_list_is_invalid() {
        let report = validate_clusters(&json!({"problem": "x"}));
        assert!(!report.is_valid);
        assert_eq!(report.total_problems, 0);
    }
}
