//! Editor bridge that hands captures to an external annotation program.

use std::process::{Command, Stdio};

use crate::capture::CapturedImage;
use crate::jobs::{JobError, UiBridge};
use crate::util::{build_command_line, write_temp_png};

/// Opens captures in an external editor such as `swappy -f` or `satty --filename`.
///
/// The image is written to a temp file and passed to the command (see
/// [`build_command_line`]). The editor runs detached; its exit is not awaited.
#[derive(Debug, Clone, Default)]
pub struct CommandEditor {
    command: Option<String>,
}

impl CommandEditor {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.filter(|c| !c.trim().is_empty()),
        }
    }
}

impl UiBridge for CommandEditor {
    fn show_editor(&self, image: CapturedImage) -> Result<(), JobError> {
        let Some(template) = self.command.as_deref() else {
            log::info!("No editor command configured, ignoring editor request");
            return Ok(());
        };

        let path = write_temp_png(&image)
            .map_err(|e| JobError::Editor(format!("Failed to write editor input: {}", e)))?;
        let Some((program, args)) = build_command_line(template, &path) else {
            return Ok(());
        };

        let child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| JobError::Editor(format!("Failed to launch '{}': {}", program, e)))?;

        log::info!(
            "Launched editor {} (pid: {}) for {}",
            program,
            child.id(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> CapturedImage {
        CapturedImage {
            width: 2,
            height: 2,
            data: vec![0; 4],
        }
    }

    #[test]
    fn missing_command_is_a_no_op() {
        assert!(CommandEditor::new(None).show_editor(image()).is_ok());
        assert!(CommandEditor::new(Some("  ".into())).show_editor(image()).is_ok());
    }

    #[test]
    fn unknown_program_is_an_editor_error() {
        let editor = CommandEditor::new(Some("snapflow-editor-that-does-not-exist".into()));
        let err = editor.show_editor(image()).unwrap_err();
        assert!(matches!(err, JobError::Editor(_)));
    }
}
