use serde_json::Value;
use thiserror::Error;

/// Failures reported by an external collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("reply is not valid JSON: {message} (line {line}, column {column})")]
    MalformedJson {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("{0}")]
    Failed(String),

    #[error("failed to invoke {program}: {source}")]
    Invoke {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Removes a Markdown code fence around a reply, if there is one.
pub fn strip_fence(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

pub fn parse_reply(reply: &str) -> Result<Value, CollaboratorError> {
    serde_json::from_str(strip_fence(reply)).map_err(|err| CollaboratorError::MalformedJson {
        message: err.to_string(),
        line: err.line(),
        column: err.column(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_fence("```json\n[1, 2]\n```\n"), "[1, 2]");
        assert_eq!(strip_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn parses_fenced_reply() -> Result<(), CollaboratorError> {
        let value = parse_reply("```json\n[{\"problem\": \"駐輪場\"}]\n```")?;
        assert_eq!(value, json!([{"problem": "駐輪場"}]));
        Ok(())
    }

    #[test]
    fn malformed_reply_reports_position() {
        match parse_reply("{\n  \"problem\": }") {
            Err(CollaboratorError::MalformedJson { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed json, got {other:?}"),
        }
    }
}
