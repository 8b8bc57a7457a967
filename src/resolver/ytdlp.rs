//! `yt-dlp` backed resolver.
//!
//! Discovery runs `yt-dlp -J` and reads the `formats` array of the info JSON.
//! Direct-link resolution re-reads the info JSON and returns the chosen
//! format's URL. Materializing resolution lets `yt-dlp` fetch into the
//! destination folder with a `%(title)s.%(ext)s` template and reads back the
//! final file path it printed, so title sanitization stays with the tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::format::FormatEntry;

use super::process::run_capture;
use super::{DownloadTarget, ResolutionError, Resolver, TargetRequest, materialized_path};

/// Executable looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_YTDLP_PROGRAM: &str = "yt-dlp";

const BASE_ARGS: [&str; 2] = ["--no-playlist", "--no-warnings"];
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
const UNKNOWN_EXTENSION: &str = "unknown";

/// Resolver driving the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: PathBuf,
}

impl YtDlpResolver {
    /// Creates a resolver that runs `yt-dlp` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(DEFAULT_YTDLP_PROGRAM)
    }

    /// Creates a resolver that runs the executable at `program`.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the executable this resolver runs.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn run(&self, args: Vec<OsString>) -> Result<String, ResolutionError> {
        let output = run_capture(&self.program, &args)
            .await
            .map_err(|error| ResolutionError::spawn_failed(&self.program, &error))?;
        if !output.success {
            return Err(ResolutionError::tool_failed(&output.stderr, output.exit_code));
        }
        Ok(output.stdout)
    }

    async fn fetch_info(&self, url: &str) -> Result<Vec<FormatEntry>, ResolutionError> {
        let url = checked_url(url)?;
        let stdout = self.run(discovery_args(url)).await?;
        parse_info_json(&stdout)
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    #[tracing::instrument(skip(self), fields(resolver = "yt-dlp"))]
    async fn discover_formats(&self, url: &str) -> Result<Vec<FormatEntry>, ResolutionError> {
        let formats = self.fetch_info(url).await?;
        info!(format_count = formats.len(), "Discovered formats");
        Ok(formats)
    }

    #[tracing::instrument(skip(self, request), fields(resolver = "yt-dlp"))]
    async fn resolve_download_target(
        &self,
        url: &str,
        format_id: &str,
        request: &TargetRequest,
    ) -> Result<DownloadTarget, ResolutionError> {
        match request {
            TargetRequest::DirectLink => {
                let formats = self.fetch_info(url).await?;
                let direct_url = direct_url_for(&formats, format_id)?;
                debug!("Resolved direct link");
                Ok(DownloadTarget::DirectLink { url: direct_url })
            }
            TargetRequest::Materialize { destination_dir } => {
                let url = checked_url(url)?;
                let stdout = self
                    .run(materialize_args(url, format_id, destination_dir))
                    .await?;
                let target = parse_materialized_output(&stdout, destination_dir)?;
                if let DownloadTarget::Materialized { path, .. } = &target {
                    info!(path = %path.display(), "Saved download");
                }
                Ok(target)
            }
        }
    }
}

fn checked_url(url: &str) -> Result<&str, ResolutionError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ResolutionError::empty_url());
    }
    Ok(trimmed)
}

fn discovery_args(url: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = BASE_ARGS.iter().map(OsString::from).collect();
    args.push("-J".into());
    args.push("--".into());
    args.push(url.into());
    args
}

fn materialize_args(url: &str, format_id: &str, destination_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = BASE_ARGS.iter().map(OsString::from).collect();
    args.push("-f".into());
    args.push(format_id.into());
    args.push("-o".into());
    args.push(destination_dir.join(OUTPUT_TEMPLATE).into_os_string());
    // --print implies --simulate; the file must actually be written.
    args.push("--no-simulate".into());
    args.push("--print".into());
    args.push("after_move:filepath".into());
    args.push("--".into());
    args.push(url.into());
    args
}

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    format_note: Option<String>,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    height: Option<u32>,
}

impl From<RawFormat> for FormatEntry {
    fn from(raw: RawFormat) -> Self {
        Self {
            id: raw.format_id,
            note: raw.format_note,
            extension: raw.ext.unwrap_or_else(|| UNKNOWN_EXTENSION.to_string()),
            url: raw.url,
            vcodec: raw.vcodec,
            acodec: raw.acodec,
            height: raw.height,
        }
    }
}

/// Parses `yt-dlp -J` output into format entries, keeping tool order.
pub(crate) fn parse_info_json(stdout: &str) -> Result<Vec<FormatEntry>, ResolutionError> {
    let info: InfoJson =
        serde_json::from_str(stdout.trim()).map_err(ResolutionError::malformed_output)?;
    Ok(info.formats.into_iter().map(FormatEntry::from).collect())
}

fn direct_url_for(formats: &[FormatEntry], format_id: &str) -> Result<String, ResolutionError> {
    let entry = formats
        .iter()
        .find(|entry| entry.id == format_id)
        .ok_or_else(|| ResolutionError::format_not_found(format_id))?;
    entry
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ResolutionError::no_direct_url(format_id))
}

/// Reads the final file path `yt-dlp` printed after moving the download.
pub(crate) fn parse_materialized_output(
    stdout: &str,
    destination_dir: &Path,
) -> Result<DownloadTarget, ResolutionError> {
    let printed = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| ResolutionError::malformed_output("no file path reported"))?;
    let printed = Path::new(printed);

    let title = printed
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            ResolutionError::malformed_output(format!(
                "cannot derive title from '{}'",
                printed.display()
            ))
        })?;
    let extension = printed
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or(UNKNOWN_EXTENSION);

    Ok(DownloadTarget::Materialized {
        title: title.to_string(),
        path: materialized_path(destination_dir, title, extension),
    })
}
