use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use snapflow::capture::CapturedImage;
use snapflow::jobs::Notifier;
use snapflow::notification::DesktopNotifier;
use snapflow::{Config, JobDependencies, JobKind, JobRegistry, JobSettings, JobStatus};

/// Exit code for a job stopped by SIGINT/SIGTERM, as shells report Ctrl-C.
const STOPPED_EXIT_CODE: u8 = 130;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SNAPFLOW_GIT_HASH"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "snapflow")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Capture-and-share job runner for Wayland desktops")]
struct Cli {
    /// Capture to perform (overrides the configured job)
    #[arg(long, short = 'j', value_enum, value_name = "KIND")]
    job: Option<JobKind>,

    /// Process an existing PNG file instead of capturing the screen
    #[arg(long, short = 'i', value_name = "FILE")]
    input: Option<PathBuf>,

    /// Save the capture to a file
    #[arg(long, action = ArgAction::SetTrue)]
    save: bool,

    /// Copy the captured image to the clipboard
    #[arg(long, action = ArgAction::SetTrue)]
    clipboard: bool,

    /// Open the capture in the configured editor
    #[arg(long, action = ArgAction::SetTrue)]
    editor: bool,

    /// Upload the capture with the configured upload command
    #[arg(long, action = ArgAction::SetTrue)]
    upload: bool,

    /// Copy the upload URL to the clipboard
    #[arg(long, action = ArgAction::SetTrue)]
    copy_url: bool,

    /// Show a desktop notification with the upload URL
    #[arg(long, action = ArgAction::SetTrue)]
    notify: bool,

    /// Ignore the actions from the config file (only the flags given here apply)
    #[arg(long, action = ArgAction::SetTrue)]
    no_actions: bool,

    /// Directory to save captures in (overrides the config file)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Config file to use instead of ~/.config/snapflow/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the effective job settings as TOML and exit
    #[arg(long, action = ArgAction::SetTrue)]
    print_config: bool,
}

impl Cli {
    /// Configured job with command-line overrides applied.
    fn job_settings(&self, configured: &JobSettings) -> JobSettings {
        let mut settings = configured.clone();
        if self.no_actions {
            settings.after_capture = Default::default();
            settings.after_upload = Default::default();
        }
        if let Some(job) = self.job {
            settings.job = job;
        }
        if let Some(dir) = &self.output_dir {
            settings.save.directory = dir.clone();
        }

        let capture = &mut settings.after_capture;
        capture.save_to_file |= self.save;
        capture.copy_image_to_clipboard |= self.clipboard;
        capture.open_in_editor |= self.editor;
        capture.upload_image |= self.upload;

        let upload = &mut settings.after_upload;
        upload.copy_url_to_clipboard |= self.copy_url;
        upload.show_notification |= self.notify;

        settings
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();
    log::debug!("snapflow {}", LONG_VERSION);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let settings = cli.job_settings(&config.job);

    if cli.print_config {
        print!(
            "{}",
            toml::to_string_pretty(&settings).context("Failed to serialize job settings")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    let input = cli.input.as_deref().map(read_input_image).transpose()?;

    if std::env::var("WAYLAND_DISPLAY").is_err() {
        log::error!("WAYLAND_DISPLAY not set - snapflow captures require a Wayland session.");
        return Err(anyhow::anyhow!("Wayland environment required"));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let registry = Arc::new(JobRegistry::new(JobDependencies::from_config(&config)));
    install_stop_handler(Arc::clone(&registry))?;

    let job = match input {
        Some(image) => runtime.block_on(registry.start_with_image(settings, image)),
        None => runtime.block_on(registry.start(settings)),
    };
    let info = job.info();

    if let Some(path) = &info.file_path {
        println!("{}", path.display());
    }
    if let Some(url) = &info.url {
        println!("{}", url);
    }

    let code = match info.status {
        JobStatus::Completed => ExitCode::SUCCESS,
        JobStatus::Stopped => {
            eprintln!("Job {} stopped", info.id);
            ExitCode::from(STOPPED_EXIT_CODE)
        }
        status => {
            eprintln!("Job {} {}", info.id, status);
            let body = format!("{} job {} failed, see the log for details", info.kind, info.id);
            if let Err(e) = runtime.block_on(DesktopNotifier.notify("Capture failed", &body)) {
                log::warn!("Failed to send notification: {}", e);
            }
            ExitCode::FAILURE
        }
    };

    Ok(code)
}

fn read_input_image(path: &std::path::Path) -> Result<CapturedImage> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read input image {}", path.display()))?;
    CapturedImage::from_png(data)
        .with_context(|| format!("{} is not a PNG image", path.display()))
}

/// SIGINT/SIGTERM request a cooperative stop of every running job.
fn install_stop_handler(registry: Arc<JobRegistry>) -> Result<()> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handler")?;

    // Runs until process exit; the iterator has no shutdown hook.
    thread::spawn(move || {
        for sig in signals.forever() {
            log::info!(
                "Received {} - stopping running jobs",
                if sig == SIGTERM { "SIGTERM" } else { "SIGINT" }
            );
            registry.stop_all();
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_add_to_configured_actions() {
        let cli = Cli::parse_from(["snapflow", "--clipboard", "--job", "active-window"]);
        let mut configured = JobSettings::default();
        configured.after_capture.save_to_file = true;

        let settings = cli.job_settings(&configured);
        assert_eq!(settings.job, JobKind::ActiveWindow);
        assert!(settings.after_capture.save_to_file);
        assert!(settings.after_capture.copy_image_to_clipboard);
        assert!(!settings.after_capture.open_in_editor);
    }

    #[test]
    fn input_image_must_be_png() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), b"not a png").unwrap();
        let err = read_input_image(temp.path()).unwrap_err();
        assert!(err.to_string().contains("is not a PNG image"));
    }

    #[test]
    fn no_actions_clears_configured_flags() {
        let cli = Cli::parse_from(["snapflow", "--no-actions", "--upload", "--copy-url"]);
        let mut configured = JobSettings::default();
        configured.after_capture.save_to_file = true;
        configured.after_upload.show_notification = true;

        let settings = cli.job_settings(&configured);
        assert!(!settings.after_capture.save_to_file);
        assert!(settings.after_capture.upload_image);
        assert!(settings.after_upload.copy_url_to_clipboard);
        assert!(!settings.after_upload.show_notification);
    }
}
