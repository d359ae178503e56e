//! File system watcher for watch mode
//!
//! The notify callback only forwards events over a channel. Reloading and
//! re-rendering happen on the thread that calls [`ExportWatcher::next_change`].

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, warn};

const DEBOUNCE_MS: u64 = 300;

/// Watches one export file and reports when it is written
pub struct ExportWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<notify::Event>>,
    file_name: OsString,
    path: PathBuf,
}

fn is_create_or_modify(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

impl ExportWatcher {
    /// Start watching the export at `path`. The parent directory is watched
    /// so editors that replace the file on save are still seen.
    pub fn watch(path: &Path) -> notify::Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| notify::Error::generic("watch target has no file name"))?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(DEBOUNCE_MS)),
        )?;
        watcher.watch(&parent, RecursiveMode::NonRecursive)?;
        debug!(path = %path.display(), "watching export");

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            file_name,
            path: path.to_path_buf(),
        })
    }

    /// Path being watched
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an event touches the watched export
    fn concerns_export(&self, event: &notify::Event) -> bool {
        is_create_or_modify(&event.kind)
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }

    /// Block up to `timeout` for a write to the export, then drain further
    /// events for DEBOUNCE_MS so one save triggers one reload. Returns
    /// `false` on timeout or when the watcher has shut down.
    pub fn next_change(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(Ok(event)) if self.concerns_export(&event) => break,
                Ok(Ok(_)) => continue,
                Ok(Err(err)) => {
                    warn!(error = %err, "watch error");
                    continue;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false
                }
            }
        }

        std::thread::sleep(Duration::from_millis(DEBOUNCE_MS));
        while self.receiver.try_recv().is_ok() {}
        true
    }
}
