//! Merging of command-line flags, config file values and defaults.

use std::path::PathBuf;
use std::time::Duration;

use clipfetch_core::chat::{DEFAULT_API_KEY_ENV, DEFAULT_CHAT_TIMEOUT_SECS};
use clipfetch_core::resolver::DEFAULT_YTDLP_PROGRAM;
use clipfetch_core::{ChatSettings, DeliveryMode, FileConfig, FormatFilter, default_output_dir};

use crate::cli::{Cli, FormatArgs, LinkArgs, SaveArgs};

/// Everything a downloader front-end needs to start.
#[derive(Debug)]
pub(crate) struct FormatRunSettings {
    pub(crate) url: Option<String>,
    pub(crate) filter: FormatFilter,
    pub(crate) delivery: DeliveryMode,
    pub(crate) output_dir: PathBuf,
    pub(crate) ytdlp_program: PathBuf,
    pub(crate) open_browser: bool,
}

/// Priority: `RUST_LOG` (applied by the subscriber) > quiet flag > verbose
/// flag > config verbosity > `info`.
pub(crate) fn resolve_default_log_level(cli: &Cli, file: &FileConfig) -> &'static str {
    if cli.quiet {
        return "error";
    }
    match cli.verbose {
        0 => file
            .verbosity
            .map_or("info", clipfetch_core::VerbositySetting::filter_directive),
        1 => "debug",
        _ => "trace",
    }
}

pub(crate) fn link_settings(args: &LinkArgs, file: &FileConfig) -> FormatRunSettings {
    format_settings(
        &args.format,
        file,
        FormatFilter::HasDirectUrl,
        DeliveryMode::DirectLink,
        None,
        !args.no_browser,
    )
}

pub(crate) fn save_settings(args: &SaveArgs, file: &FileConfig) -> FormatRunSettings {
    format_settings(
        &args.format,
        file,
        FormatFilter::HasVideoTrack,
        DeliveryMode::Materialize,
        args.output_dir.clone(),
        false,
    )
}

fn format_settings(
    args: &FormatArgs,
    file: &FileConfig,
    default_filter: FormatFilter,
    delivery: DeliveryMode,
    output_dir_flag: Option<PathBuf>,
    open_browser: bool,
) -> FormatRunSettings {
    FormatRunSettings {
        url: args.url.clone(),
        filter: args.filter.map_or(default_filter, FormatFilter::from),
        delivery,
        output_dir: output_dir_flag
            .or_else(|| file.output_dir.clone())
            .unwrap_or_else(default_output_dir),
        ytdlp_program: args
            .ytdlp_path
            .clone()
            .or_else(|| file.ytdlp_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP_PROGRAM)),
        open_browser,
    }
}

/// Builds chat settings from the config file and reads the API key from the
/// configured environment variable.
pub(crate) fn chat_settings(file: &FileConfig) -> ChatSettings {
    let defaults = ChatSettings::default();
    ChatSettings {
        endpoint: file.chat_endpoint.clone().unwrap_or(defaults.endpoint),
        model: file.chat_model.clone().unwrap_or(defaults.model),
        timeout: Duration::from_secs(file.chat_timeout_secs.unwrap_or(DEFAULT_CHAT_TIMEOUT_SECS)),
        ..ChatSettings::default()
    }
    .with_key_from_env(
        file.chat_api_key_env
            .clone()
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
    )
}
