//! File saving and filename templating for captured images.

use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::CapturedImage;
use crate::jobs::{FileNamer, ImageSaver, JobError, NameContext, SaveSettings};

const EXTENSION: &str = "png";
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Filename template resolver.
///
/// `{width}`, `{height}`, `{counter}` and zero-padded `{counter:N}` are
/// substituted first; whatever remains is expanded as a chrono `strftime`
/// pattern against the capture timestamp.
#[derive(Debug, Default)]
pub struct PatternNamer {
    counter: AtomicU64,
}

impl PatternNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the running counter at `value` (the next `{counter}` yields it).
    pub fn starting_at(value: u64) -> Self {
        Self {
            counter: AtomicU64::new(value),
        }
    }
}

impl FileNamer for PatternNamer {
    fn resolve(&self, pattern: &str, context: &NameContext) -> String {
        let mut name = pattern
            .replace("{width}", &context.width.to_string())
            .replace("{height}", &context.height.to_string());

        if name.contains("{counter") {
            let value = self.counter.fetch_add(1, Ordering::Relaxed);
            name = substitute_counter(&name, value);
        }

        let mut expanded = String::new();
        if write!(expanded, "{}", context.timestamp.format(&name)).is_err() {
            log::warn!(
                "Filename template '{}' has invalid time specifiers; using it verbatim",
                pattern
            );
            expanded = name;
        }

        sanitize_filename(&expanded)
    }
}

fn substitute_counter(input: &str, value: u64) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{counter") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + "{counter".len()..];
        let Some(end) = tail.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        match &tail[..end] {
            "" => out.push_str(&value.to_string()),
            spec => match spec.strip_prefix(':').and_then(|w| w.parse::<usize>().ok()) {
                Some(width) => out.push_str(&format!("{value:0width$}")),
                None => out.push_str(&rest[start..start + "{counter".len() + end + 1]),
            },
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.is_empty() {
        "capture".to_string()
    } else {
        cleaned
    }
}

/// Writes captured images to disk under a templated name.
pub struct DiskSaver {
    namer: Arc<dyn FileNamer>,
}

impl DiskSaver {
    pub fn new(namer: Arc<dyn FileNamer>) -> Self {
        Self { namer }
    }
}

impl Default for DiskSaver {
    fn default() -> Self {
        Self::new(Arc::new(PatternNamer::new()))
    }
}

impl ImageSaver for DiskSaver {
    fn save(&self, image: &CapturedImage, settings: &SaveSettings) -> Result<PathBuf, JobError> {
        let directory = ensure_directory_exists(&expand_tilde(&settings.directory))?;

        let context = NameContext {
            width: image.width,
            height: image.height,
            timestamp: chrono::Local::now(),
        };
        let stem = self.namer.resolve(&settings.filename_template, &context);
        let (file_path, mut file) = create_unique(&directory, &stem)?;

        log::info!(
            "Saving capture to: {} ({} bytes)",
            file_path.display(),
            image.len()
        );
        file.write_all(&image.data)?;

        Ok(file_path)
    }
}

/// Create `<stem>.png`, or `<stem> (n).png` when that name is taken.
///
/// The file is created exclusively, so concurrent saves never share a name.
fn create_unique(directory: &Path, stem: &str) -> io::Result<(PathBuf, File)> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    // User read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    for n in 0u32.. {
        let path = if n == 0 {
            directory.join(format!("{stem}.{EXTENSION}"))
        } else {
            directory.join(format!("{stem} ({n}).{EXTENSION}"))
        };
        match options.open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::other(format!("no free file name for {stem}")))
}

/// Ensure the save directory exists, creating it if necessary.
pub fn ensure_directory_exists(directory: &Path) -> Result<PathBuf, JobError> {
    if !directory.exists() {
        log::info!("Creating capture directory: {}", directory.display());
        fs::create_dir_all(directory)?;
    }

    Ok(directory
        .canonicalize()
        .unwrap_or_else(|_| directory.to_path_buf()))
}

/// Expand a leading `~/` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    path.to_path_buf()
}
