//! Uploader that delegates to a user-configured command.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use async_trait::async_trait;
use tokio::task;

use crate::jobs::{JobError, UploadResult, UploadSource, Uploader};
use crate::util::{build_command_line, write_temp_png};

/// Runs a command such as `curl -sF file=@{file} https://0x0.st` and takes
/// the first `http(s)://` line it prints as the resulting URL.
#[derive(Debug, Clone)]
pub struct CommandUploader {
    command: String,
}

impl CommandUploader {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Uploader for CommandUploader {
    async fn upload(&self, source: UploadSource<'_>) -> Result<UploadResult, JobError> {
        let (path, temporary) = match source {
            UploadSource::File(path) => (path.to_path_buf(), false),
            UploadSource::Image(image) => {
                let path = write_temp_png(image)
                    .map_err(|e| JobError::Upload(format!("Failed to stage image: {}", e)))?;
                (path, true)
            }
        };

        let command = self.command.clone();
        let staged = path.clone();
        let result = task::spawn_blocking(move || run_upload_command(&command, staged))
            .await
            .map_err(|e| JobError::Task(format!("upload task failed: {}", e)))?;

        if temporary && let Err(e) = std::fs::remove_file(&path) {
            log::warn!("Failed to remove staged upload {}: {}", path.display(), e);
        }

        result
    }
}

fn run_upload_command(template: &str, path: PathBuf) -> Result<UploadResult, JobError> {
    let (program, args) = build_command_line(template, &path)
        .ok_or_else(|| JobError::Upload("upload command is empty".to_string()))?;

    log::debug!("Uploading {} via {}", path.display(), program);
    let output = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| JobError::Upload(format!("Failed to run '{}': {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(JobError::Upload(format!(
            "'{}' exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_upload_output(&stdout)
        .map(UploadResult::new)
        .ok_or_else(|| JobError::Upload(format!("'{}' printed no URL", program)))
}

fn parse_upload_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("https://") || line.starts_with("http://"))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CapturedImage;

    #[test]
    fn picks_first_url_line() {
        let output = "uploading...\n  https://example.com/a.png  \nhttps://example.com/b\n";
        assert_eq!(
            parse_upload_output(output).as_deref(),
            Some("https://example.com/a.png")
        );
        assert_eq!(parse_upload_output("done\n"), None);
    }

    #[tokio::test]
    async fn in_memory_image_is_staged_and_cleaned_up() {
        let uploader = CommandUploader::new("echo https://files.example/{file}");
        let image = CapturedImage {
            width: 1,
            height: 1,
            data: vec![1],
        };

        let result = uploader.upload(UploadSource::Image(&image)).await.unwrap();
        let staged = result.url.trim_start_matches("https://files.example/");
        assert!(staged.ends_with(".png"));
        assert!(!std::path::Path::new(staged).exists());
    }

    #[tokio::test]
    async fn failing_command_is_an_upload_error() {
        let uploader = CommandUploader::new("false");
        let err = uploader
            .upload(UploadSource::File(std::path::Path::new("/tmp/x.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Upload(_)));
    }
}
