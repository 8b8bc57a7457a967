//! Stand-in `yt-dlp` executables written as shell scripts.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const INFO_JSON: &str = r#"{"title":"My Video","formats":[{"format_id":"18","format_note":"360p","ext":"mp4","url":"https://cdn.example/18.mp4","vcodec":"avc1.42001E","acodec":"mp4a.40.2","height":360},{"format_id":"140","format_note":"medium","ext":"m4a","url":"https://cdn.example/140.m4a","vcodec":"none","acodec":"mp4a.40.2"},{"format_id":"sb0","format_note":"storyboard","ext":"mhtml","vcodec":"none","acodec":"none"}]}"#;

/// Writes a script that answers `-J` with [`INFO_JSON`] and, for a
/// materializing call, creates `My Video.<ext>` next to the `-o` template and
/// prints its path.
pub fn write_working_script(dir: &Path) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
out=""
mode=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  if [ "$arg" = "-J" ]; then mode="info"; fi
  if [ "$arg" = "--print" ]; then mode="save"; fi
  prev="$arg"
done
if [ "$mode" = "info" ]; then
  cat <<'JSON'
{INFO_JSON}
JSON
  exit 0
fi
if [ "$mode" = "save" ]; then
  target="$(dirname "$out")/My Video.mp4"
  : > "$target"
  echo "$target"
  exit 0
fi
echo "ERROR: unexpected invocation: $*" >&2
exit 2
"#
    );
    write_script(dir, "yt-dlp", &script)
}

/// Writes a script that always fails with `stderr_line`.
pub fn write_failing_script(dir: &Path, stderr_line: &str) -> PathBuf {
    let script = format!("#!/bin/sh\necho 'WARNING: ignored' >&2\necho '{stderr_line}' >&2\nexit 1\n");
    write_script(dir, "yt-dlp-broken", &script)
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
    path
}
