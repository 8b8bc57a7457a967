//! Format resolution and download service.
//!
//! This module is the thin client over the external media-extraction tool.
//! It reports the formats a source URL offers and turns a chosen format id
//! into something the user can actually get: either a direct link handed to
//! the platform browser, or a file materialized in the destination folder.
//!
//! # Architecture
//!
//! - [`Resolver`] - Async trait that resolver backends implement
//! - [`YtDlpResolver`] - Production backend driving the `yt-dlp` executable
//! - [`TargetRequest`] - How the caller wants the chosen format delivered
//! - [`DownloadTarget`] - What the resolver produced for that request
//! - [`ResolutionError`] - Single error type for every resolver failure
//!
//! Filtering of discovered formats is not part of the resolver;
//! see [`crate::format::FormatFilter`].
//!
//! # Example
//!
//! ```no_run
//! use clipfetch_core::resolver::{Resolver, TargetRequest, YtDlpResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = YtDlpResolver::new();
//! let formats = resolver.discover_formats("https://example.com/watch?v=abc").await?;
//! if let Some(first) = formats.first() {
//!     let target = resolver
//!         .resolve_download_target("https://example.com/watch?v=abc", &first.id, &TargetRequest::DirectLink)
//!         .await?;
//!     println!("{target:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod process;
mod ytdlp;

pub use error::ResolutionError;
pub use ytdlp::{DEFAULT_YTDLP_PROGRAM, YtDlpResolver};

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::format::FormatEntry;

/// How the caller wants a chosen format delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRequest {
    /// Return a direct fetchable URL; no local file I/O.
    DirectLink,
    /// Fetch the file and write it to `destination_dir/<title>.<ext>`.
    Materialize {
        /// Folder the resolver writes into.
        destination_dir: PathBuf,
    },
}

/// Result of resolving a chosen format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// URL the client hands off to the platform browser.
    DirectLink {
        /// Direct fetchable URL for the chosen format.
        url: String,
    },
    /// File written by the resolver.
    Materialized {
        /// Title as sanitized by the resolver.
        title: String,
        /// Final path on disk.
        path: PathBuf,
    },
}

/// Final path of a materialized download: `<dir>/<title>.<ext>`.
///
/// `title` is expected to be sanitized by the resolver already; it is used
/// verbatim.
#[must_use]
pub fn materialized_path(destination_dir: &Path, title: &str, extension: &str) -> PathBuf {
    destination_dir.join(format!("{title}.{extension}"))
}

/// Trait that resolver backends implement.
///
/// Calls may block for a long time (network, transcoding) and must be run
/// off the dispatcher; [`crate::task::TaskController`] takes care of that.
///
/// # Object Safety
///
/// Uses `async_trait` so workflows can hold an `Arc<dyn Resolver>`.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Returns the resolver's name (e.g. "yt-dlp").
    fn name(&self) -> &str;

    /// Lists every format the source offers, in resolver order.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the source cannot be inspected.
    async fn discover_formats(&self, url: &str) -> Result<Vec<FormatEntry>, ResolutionError>;

    /// Resolves `format_id` of `url` according to `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the format is unknown, has no direct
    /// URL (direct-link mode), or the fetch fails (materializing mode).
    async fn resolve_download_target(
        &self,
        url: &str,
        format_id: &str,
        request: &TargetRequest,
    ) -> Result<DownloadTarget, ResolutionError>;
}
