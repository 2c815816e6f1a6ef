use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use crate::assist::reply::CollaboratorError;
use crate::core::model::OcrResponse;
use crate::ocr::{OcrRequest, OcrService};

/// Runs an external OCR program once per image.
///
/// The image is staged in `work_dir`, then the program is called as
/// `<program> [args...] --image <path> --mime <type>` and must print an
/// `OcrResponse` JSON object on stdout.
#[derive(Debug, Clone)]
pub struct CommandOcr {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
}

impl CommandOcr {
    pub fn new(program: impl Into<String>, work_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn stage(&self, request: &OcrRequest) -> Result<PathBuf> {
        fs::create_dir_all(&self.work_dir)
            .with_context(|| format!("failed to create {}", self.work_dir.display()))?;
        let name = Path::new(&request.name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "image".into());
        let path = self.work_dir.join(name);
        fs::write(&path, &request.bytes)
            .with_context(|| format!("failed to stage {}", path.display()))?;
        Ok(path)
    }
}

impl OcrService for CommandOcr {
    fn recognize(&self, request: &OcrRequest) -> Result<OcrResponse> {
        let image_path = self.stage(request)?;
        debug!(program = %self.program, image = %image_path.display(), "invoking OCR");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--image")
            .arg(&image_path)
            .arg("--mime")
            .arg(&request.mime_type)
            .output()
            .map_err(|source| CollaboratorError::Invoke {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::Failed(format!(
                "OCR program exited with {}: {}",
                output.status,
                stderr.trim()
            ))
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let response: OcrResponse = serde_json::from_str(stdout.trim())
            .with_context(|| format!("failed to parse OCR response for {}", request.name))?;
        Ok(response)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str, work_dir: PathBuf) -> CommandOcr {
        CommandOcr::new("sh", work_dir).with_args(vec![
            "-c".to_string(),
            script.to_string(),
            "sh".to_string(),
        ])
    }

    #[test]
    fn parses_program_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let ocr = shell(
            r#"printf '{"success": true, "text": "%s", "engine": "stub"}' "$4""#,
            dir.path().to_path_buf(),
        );

        let response = ocr.recognize(&OcrRequest::png("section_1.png", vec![1, 2, 3]))?;
        assert!(response.success);
        assert_eq!(response.best_text(), "image/png");
        assert_eq!(fs::read(dir.path().join("section_1.png"))?, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn non_zero_exit_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let ocr = shell("echo quota exceeded >&2; exit 3", dir.path().to_path_buf());

        let err = ocr
            .recognize(&OcrRequest::png("section_1.png", Vec::new()))
            .expect_err("program failed");
        assert!(err.to_string().contains("quota exceeded"), "{err}");
        Ok(())
    }

    #[test]
    fn garbage_output_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let ocr = shell("echo not json", dir.path().to_path_buf());
        assert!(ocr
            .recognize(&OcrRequest::png("section_1.png", Vec::new()))
            .is_err());
        Ok(())
    }

    #[test]
    fn missing_program_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let ocr = CommandOcr::new("sheetscan-no-such-ocr-program", dir.path().to_path_buf());
        let err = ocr
            .recognize(&OcrRequest::png("x.png", Vec::new()))
            .expect_err("program is missing");
        assert!(err.to_string().contains("sheetscan-no-such-ocr-program"));
        Ok(())
    }
}
