//! Format option model and label mapping.
//!
//! A [`FormatEntry`] is the raw metadata the resolver reports for one
//! downloadable variant. A [`FormatOption`] is the user-facing projection of
//! that entry: the id understood by the resolver plus a human-readable note
//! and container extension.
//!
//! The display label (`"<id> - <note> - <ext>"`) is the stable external
//! representation shown to and chosen by the user. [`parse_format_id`] maps a
//! chosen label back to the resolver id by taking the text before the first
//! [`LABEL_SEPARATOR`].

mod filter;

pub use filter::FormatFilter;

use std::fmt;

/// Separator between id, note and extension in a display label.
pub const LABEL_SEPARATOR: &str = " - ";

/// Raw per-format metadata as reported by the resolver.
///
/// Filters run over entries, so every field a filter policy may need lives
/// here even though the user only ever sees the [`FormatOption`] projection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatEntry {
    /// Resolver format code (e.g. `"22"`, `"137"`, `"hls-720p"`).
    pub id: String,
    /// Resolution or bitrate hint, when the resolver reports one.
    pub note: Option<String>,
    /// Container extension (e.g. `"mp4"`).
    pub extension: String,
    /// Direct fetchable URL, when the resolver exposes one.
    pub url: Option<String>,
    /// Video codec name; `"none"` for audio-only formats.
    pub vcodec: Option<String>,
    /// Audio codec name; `"none"` for video-only formats.
    pub acodec: Option<String>,
    /// Frame height in pixels, when known.
    pub height: Option<u32>,
}

impl FormatEntry {
    /// Creates an entry with only the fields every format carries.
    #[must_use]
    pub fn new(id: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extension: extension.into(),
            ..Self::default()
        }
    }

    /// Returns true if the entry exposes a direct fetchable URL.
    #[must_use]
    pub fn has_direct_url(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }

    /// Returns true if the entry includes a video track.
    #[must_use]
    pub fn has_video_track(&self) -> bool {
        codec_present(self.vcodec.as_deref())
    }
}

fn codec_present(codec: Option<&str>) -> bool {
    codec.is_some_and(|value| {
        let value = value.trim();
        !value.is_empty() && !value.eq_ignore_ascii_case("none")
    })
}

/// One selectable quality/container variant of a source video.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatOption {
    /// Opaque identifier understood by the resolver.
    pub id: String,
    /// Human-readable label (resolution/bitrate hint); may be empty.
    pub note: String,
    /// Container/file type string.
    pub extension: String,
}

impl FormatOption {
    /// Creates a new format option.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        note: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            note: note.into(),
            extension: extension.into(),
        }
    }

    /// Returns the label shown to and chosen by the user.
    #[must_use]
    pub fn display_label(&self) -> String {
        format!(
            "{}{LABEL_SEPARATOR}{}{LABEL_SEPARATOR}{}",
            self.id, self.note, self.extension
        )
    }
}

impl From<&FormatEntry> for FormatOption {
    fn from(entry: &FormatEntry) -> Self {
        Self {
            id: entry.id.clone(),
            note: entry.note.clone().unwrap_or_default(),
            extension: entry.extension.clone(),
        }
    }
}

impl fmt::Display for FormatOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_label())
    }
}

/// Maps a chosen display label back to the resolver format id.
///
/// Returns the text before the first [`LABEL_SEPARATOR`], or the whole label
/// when the separator is absent (a bare id typed by the user).
#[must_use]
pub fn parse_format_id(label: &str) -> &str {
    label
        .split_once(LABEL_SEPARATOR)
        .map_or(label, |(id, _)| id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_joins_fields_with_separator() {
        let option = FormatOption::new("137", "1080p", "mp4");
        assert_eq!(option.display_label(), "137 - 1080p - mp4");
        assert_eq!(option.to_string(), "137 - 1080p - mp4");
    }

    #[test]
    fn test_parse_format_id_takes_text_before_first_separator() {
        assert_eq!(parse_format_id("137 - 1080p - mp4"), "137");
        assert_eq!(parse_format_id("hls-720p - 720p - mp4"), "hls-720p");
    }

    #[test]
    fn test_parse_format_id_without_separator_returns_label() {
        assert_eq!(parse_format_id("251"), "251");
    }

    #[test]
    fn test_label_round_trip_for_ids_with_dashes_and_spaces() {
        // Ids may contain '-' or ' ' individually; only " - " is reserved.
        for id in ["18", "hls-1080p", "dash video", "a-b c-d", "x -y", ""] {
            let option = FormatOption::new(id, "note - with separator", "webm");
            assert_eq!(parse_format_id(&option.display_label()), id, "id {id:?}");
        }

        // A trailing " -" fuses with the separator, so selection goes by the
        // whole label instead of the parsed id.
        let options: Vec<FormatOption> = ["x -", "x", "y - "]
            .iter()
            .map(|id| FormatOption::new(*id, "720p", "mp4"))
            .collect();
        let mut session = crate::session::Session::new("/out");
        session.replace_options(options.clone());
        for option in &options {
            let selected = session.select(&option.display_label()).unwrap();
            assert_eq!(selected, option, "label {:?}", option.display_label());
        }
    }

    #[test]
    fn test_option_from_entry_without_note_uses_empty_segment() {
        let entry = FormatEntry::new("18", "mp4");
        let option = FormatOption::from(&entry);
        assert_eq!(option.note, "");
        assert_eq!(option.display_label(), "18 -  - mp4");
        assert_eq!(parse_format_id(&option.display_label()), "18");
    }

    #[test]
    fn test_entry_track_detection() {
        let mut entry = FormatEntry::new("140", "m4a");
        entry.vcodec = Some("none".to_string());
        entry.acodec = Some("mp4a.40.2".to_string());
        assert!(!entry.has_video_track());

        entry.vcodec = Some("avc1.64001F".to_string());
        assert!(entry.has_video_track());

        entry.vcodec = None;
        assert!(!entry.has_video_track());
    }

    #[test]
    fn test_entry_direct_url_detection() {
        let mut entry = FormatEntry::new("18", "mp4");
        assert!(!entry.has_direct_url());
        entry.url = Some("   ".to_string());
        assert!(!entry.has_direct_url());
        entry.url = Some("https://cdn.example.com/v.mp4".to_string());
        assert!(entry.has_direct_url());
    }
}
