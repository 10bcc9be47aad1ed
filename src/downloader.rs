use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::ExitStatus,
};

use crate::config;

pub const DEFAULT_PROGRAM: &str = "yt-dlp";
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";
pub const DEFAULT_QUALITY: &str = "best";
pub const OUTPUT_TEMPLATE: &str = "%(title)s-%(id)s.%(ext)s";

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

#[derive(thiserror::Error, Debug)]
pub enum DownloaderError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("yt-dlp failed ({status}): {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    /// Passed to `yt-dlp -f`
    pub quality: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            quality: DEFAULT_QUALITY.to_string(),
        }
    }
}

/// Thin handle on the yt-dlp executable. All of the actual downloading
/// happens inside yt-dlp.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: OsString,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlp {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    pub fn with_program(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
        }
    }

    /// Uses `YT_DLP_PATH` when set, `yt-dlp` from `PATH` otherwise.
    pub fn from_env() -> Self {
        match config::var(config::YT_DLP_PATH_VAR) {
            Some(path) => Self::with_program(path),
            None => Self::new(),
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    fn args(&self, video: &str, options: &DownloadOptions) -> Vec<OsString> {
        vec![
            "-f".into(),
            options.quality.clone().into(),
            "-o".into(),
            options.output_dir.join(OUTPUT_TEMPLATE).into_os_string(),
            video_url(video).into(),
        ]
    }

    /// Downloads a video by ID or URL into `options.output_dir`, creating it
    /// if needed, and returns that directory.
    pub async fn download(
        &self,
        video: &str,
        options: &DownloadOptions,
    ) -> Result<PathBuf, DownloaderError> {
        tokio::fs::create_dir_all(&options.output_dir).await?;

        let args = self.args(video, options);
        info!("Downloading {} to {}", video, options.output_dir.display());
        debug!("{:?} {:?}", self.program, args);

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(DownloaderError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(options.output_dir.clone())
    }
}

/// Wraps a bare video ID in a watch URL. Anything that already looks like a
/// URL is passed through.
pub fn video_url(video: &str) -> String {
    let video = video.trim();
    if video.starts_with("http://") || video.starts_with("https://") {
        video.to_string()
    } else {
        format!("{}{}", WATCH_URL, video)
    }
}

pub async fn download_video(
    video: &str,
    output_dir: impl AsRef<Path>,
    quality: &str,
) -> Result<PathBuf, DownloaderError> {
    let options = DownloadOptions {
        output_dir: output_dir.as_ref().to_path_buf(),
        quality: quality.to_string(),
    };
    YtDlp::from_env().download(video, &options).await
}
