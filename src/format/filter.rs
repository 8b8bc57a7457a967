//! Call-site filter policies for discovered formats.
//!
//! The resolver reports every format it finds; which ones are offered to the
//! user is decided here, at the call site. Front-ends pick a policy without
//! changing resolver behavior.

use std::fmt;
use std::sync::Arc;

use super::{FormatEntry, FormatOption};

/// Predicate deciding which discovered formats are offered to the user.
#[derive(Clone, Default)]
pub enum FormatFilter {
    /// Any format exposing a direct URL.
    #[default]
    HasDirectUrl,
    /// Any format that includes a video track.
    HasVideoTrack,
    /// Every format the resolver reports.
    Any,
    /// Caller-supplied predicate.
    Custom(Arc<dyn Fn(&FormatEntry) -> bool + Send + Sync>),
}

impl FormatFilter {
    /// Builds a filter from an arbitrary predicate.
    #[must_use]
    pub fn custom(predicate: impl Fn(&FormatEntry) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    /// Returns true if `entry` passes this filter.
    #[must_use]
    pub fn matches(&self, entry: &FormatEntry) -> bool {
        match self {
            Self::HasDirectUrl => entry.has_direct_url(),
            Self::HasVideoTrack => entry.has_video_track(),
            Self::Any => true,
            Self::Custom(predicate) => predicate(entry),
        }
    }

    /// Filters `entries` and projects the survivors to options, keeping order.
    #[must_use]
    pub fn apply(&self, entries: &[FormatEntry]) -> Vec<FormatOption> {
        entries
            .iter()
            .filter(|entry| self.matches(entry))
            .map(FormatOption::from)
            .collect()
    }

    /// Returns the stable policy name used in config and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::HasDirectUrl => "url",
            Self::HasVideoTrack => "video",
            Self::Any => "any",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for FormatFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormatFilter({})", self.name())
    }
}
