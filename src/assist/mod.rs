//! Language-model collaborator: correction, clustering and report drafting.

pub mod correct;
pub mod organize;
pub mod reply;

pub use correct::{correct_all, correct_one, successful_records, text_only, Correction};
pub use organize::{
    organize, organize_sections, organizer_input, section_recognition, validate_clusters,
    ClusterValidation,
};
pub use reply::{parse_reply, strip_fence, CollaboratorError};

use std::fmt;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistTask {
    Correct,
    Organize,
    Markdown,
}

impl AssistTask {
    pub fn as_str(self) -> &'static str {
        match self {
            AssistTask::Correct => "correct",
            AssistTask::Organize => "organize",
            AssistTask::Markdown => "markdown",
        }
    }
}

impl fmt::Display for AssistTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Assistant {
    /// Raw reply text for `payload`.
    fn complete(&self, task: AssistTask, payload: &str) -> Result<String>;
}

/// Runs `<program> [args...] --task <task>` with the payload on stdin and
/// returns whatever the program prints.
#[derive(Debug, Clone)]
pub struct CommandAssistant {
    program: String,
    args: Vec<String>,
}

impl CommandAssistant {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl Assistant for CommandAssistant {
    fn complete(&self, task: AssistTask, payload: &str) -> Result<String> {
        debug!(program = %self.program, %task, bytes = payload.len(), "invoking assistant");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--task")
            .arg(task.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CollaboratorError::Invoke {
                program: self.program.clone(),
                source,
            })?;

        // stdin is written on its own thread while stdout and stderr drain
        let writer = child.stdin.take().map(|mut stdin| {
            let bytes = payload.as_bytes().to_vec();
            thread::spawn(move || stdin.write_all(&bytes))
        });

        let output = child
            .wait_with_output()
            .with_context(|| format!("assistant did not finish the {task} task"))?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                // the child may exit without draining stdin; its status decides
                Ok(Err(err)) if err.kind() == ErrorKind::BrokenPipe => {}
                Ok(Err(err)) => {
                    return Err(err).with_context(|| format!("failed to send {task} payload"))
                }
                Err(_) => anyhow::bail!("payload writer for {task} panicked"),
            }
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::Failed(format!(
                "assistant exited with {} on {task}: {}",
                output.status,
                stderr.trim()
            ))
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
