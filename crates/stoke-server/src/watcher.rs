//! File watching for live reload.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A source module changed
    SourceChanged(PathBuf),

    /// A static asset changed
    AssetChanged(PathBuf),

    /// A watched file was removed
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::SourceChanged(p) | WatchEvent::AssetChanged(p) | WatchEvent::Removed(p) => p,
        }
    }
}

/// Watches project directories and forwards debounced change events.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Returns the watcher and a channel to receive events. The watcher must
    /// stay alive for as long as events are wanted.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        // Bridge notify's callback thread into the async world, collapsing
        // bursts of events from editors that write in several steps.
        std::thread::spawn(move || {
            let mut last_event_time = std::time::Instant::now();
            let debounce = Duration::from_millis(100);

            while let Ok(event) = sync_rx.recv() {
                let now = std::time::Instant::now();
                if now.duration_since(last_event_time) < debounce {
                    continue;
                }
                last_event_time = now;

                for path in event.paths {
                    if let Some(e) = classify_event(&path, &event.kind) {
                        let _ = async_tx.blocking_send(e);
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    match kind {
        EventKind::Remove(_) => Some(WatchEvent::Removed(path.to_path_buf())),
        EventKind::Create(_) | EventKind::Modify(_) => {
            if is_source_module(path) {
                Some(WatchEvent::SourceChanged(path.to_path_buf()))
            } else {
                Some(WatchEvent::AssetChanged(path.to_path_buf()))
            }
        }
        _ => None,
    }
}

fn is_source_module(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classifies_source_modules() {
        let event = classify_event(
            Path::new("src/index.js"),
            &notify::EventKind::Modify(notify::event::ModifyKind::Any),
        );
        assert!(matches!(event, Some(WatchEvent::SourceChanged(_))));
    }

    #[test]
    fn classifies_assets() {
        let event = classify_event(
            Path::new("public/index.html"),
            &notify::EventKind::Modify(notify::event::ModifyKind::Any),
        );
        assert!(matches!(event, Some(WatchEvent::AssetChanged(_))));
    }

    #[tokio::test]
    async fn watches_file_changes() {
        let temp = tempdir().unwrap();
        let test_file = temp.path().join("index.js");

        // Create the watcher first (so it catches file creation)
        let (watcher, mut rx) = FileWatcher::new(&[temp.path().to_path_buf()]).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&test_file, "export {};").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        assert!(event.unwrap().is_some(), "channel should not be closed");
    }
}
