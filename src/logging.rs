//! File-backed `tracing` setup. The terminal belongs to the TUI, so log
//! output never goes to stdout or stderr.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LoggingSettings, default_log_path};

/// Install the global subscriber. Returns the file being written to, or
/// `None` when logging is disabled because no file could be opened.
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let path = settings.file.clone().or_else(default_log_path)?;
    let file = open_log_file(&path).ok()?;

    let installed = tracing_subscriber::registry()
        .with(filter(&settings.level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init();

    installed.ok().map(|()| path)
}

/// `RUST_LOG` wins; otherwise the configured level, otherwise `info`.
pub(crate) fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub(crate) fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_log_file_creates_parent_dirs_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("nceplay").join("nceplay.log");

        {
            use std::io::Write;
            let mut f = open_log_file(&path).unwrap();
            writeln!(f, "first").unwrap();
        }
        {
            use std::io::Write;
            let mut f = open_log_file(&path).unwrap();
            writeln!(f, "second").unwrap();
        }

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "first\nsecond\n");
    }

    #[test]
    fn bad_level_falls_back_instead_of_failing() {
        let f = filter("this is [not a directive");
        assert!(!f.to_string().is_empty());
    }
}
