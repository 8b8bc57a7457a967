//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clipfetch_core::FormatFilter;

/// Fetch video formats, pick one, and download it.
///
/// `link` opens a direct link for the chosen format in the browser, `save`
/// downloads it into a folder, and `chat` talks to a remote model.
/// Everything after start-up is interactive; type `help` at the prompt.
#[derive(Parser, Debug)]
#[command(name = "clipfetch")]
#[command(author, version, about)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Front-end variant to run.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a direct link for a format and open it in the browser
    Link(LinkArgs),
    /// Download a format into the destination folder
    Save(SaveArgs),
    /// Chat with a remote completions API
    Chat,
}

/// Options shared by the downloader front-ends.
#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    /// Video page URL to fetch formats for at start-up
    pub url: Option<String>,

    /// Which formats to offer (default: url for link, video for save)
    #[arg(long, value_enum)]
    pub filter: Option<FilterArg>,

    /// Path to the yt-dlp executable
    #[arg(long, value_name = "PATH")]
    pub ytdlp_path: Option<PathBuf>,
}

/// Arguments for `link`.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    #[command(flatten)]
    pub format: FormatArgs,

    /// Print resolved links without opening a browser
    #[arg(long)]
    pub no_browser: bool,
}

/// Arguments for `save`.
#[derive(Args, Debug, Clone)]
pub struct SaveArgs {
    #[command(flatten)]
    pub format: FormatArgs,

    /// Destination folder (default: <documents>/clipfetch)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Format filter policy selectable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterArg {
    /// Only formats with a direct download URL
    Url,
    /// Only formats with a video track
    Video,
    /// Every format
    Any,
}

impl From<FilterArg> for FormatFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Url => Self::HasDirectUrl,
            FilterArg::Video => Self::HasVideoTrack,
            FilterArg::Any => Self::Any,
        }
    }
}
