//! Helpers shared by the command-driven collaborators (editor, uploader).

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::capture::CapturedImage;

/// Placeholder replaced by the image path in editor and uploader commands.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Split a command template into program and arguments.
///
/// Arguments are whitespace separated. Every `{file}` is replaced with
/// `path`; when the template has none, the path is appended as the last
/// argument. Returns `None` for a blank template.
pub fn build_command_line(template: &str, path: &Path) -> Option<(String, Vec<String>)> {
    let path = path.to_string_lossy();
    let mut parts = template.split_whitespace();
    let program = parts.next()?.to_string();

    let mut args: Vec<String> = parts
        .map(|part| part.replace(FILE_PLACEHOLDER, &path))
        .collect();
    if !template.contains(FILE_PLACEHOLDER) {
        args.push(path.into_owned());
    }

    Some((program, args))
}

/// Write the image to a PNG file in the temp directory that outlives this
/// process, for handing to external programs.
pub fn write_temp_png(image: &CapturedImage) -> std::io::Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("snapflow-")
        .suffix(".png")
        .tempfile()?;
    file.write_all(&image.data)?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}
