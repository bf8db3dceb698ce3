//! Configuration type definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// External editor used by the `open_in_editor` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EditorConfig {
    /// Command to open a capture with, e.g. `"swappy -f"`. `{file}` is
    /// replaced with the image path; without it the path is appended.
    /// Unset means editor requests are ignored.
    pub command: Option<String>,
}

/// Uploader used by the `upload_image` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct UploadConfig {
    /// Command that uploads `{file}` and prints the resulting URL, e.g.
    /// `"curl -sF file=@{file} https://0x0.st"`. Unset disables uploads.
    pub command: Option<String>,
}
