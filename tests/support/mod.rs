#[cfg(unix)]
#[allow(dead_code)]
pub mod fake_ytdlp;
