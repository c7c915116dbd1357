//! Asset compiler adapter.
//!
//! Wraps an opaque [`Bundler`] and turns its completion callback into a
//! broadcast channel of [`CompileEvent`]s that the launcher subscribes to.
//! Instructions are only flagged for display on the first successful
//! compile; rebuilds stay quiet.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use walkdir::WalkDir;

/// Build mode for a bundler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

/// Inputs for a single bundler run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Directory containing static assets (index.html lives here)
    pub public_dir: PathBuf,

    /// Application entry module
    pub entry: PathBuf,

    /// Development or production
    pub mode: BuildMode,

    /// Output directory, required for production builds
    pub output_dir: Option<PathBuf>,
}

/// Result of a bundler run.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Number of assets processed
    pub assets: usize,

    /// Total time in milliseconds
    pub duration_ms: u64,
}

/// Errors that can occur while bundling.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Entry module not found: {0}")]
    MissingEntry(PathBuf),

    #[error("Output directory is required for production builds")]
    MissingOutputDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Lifecycle events emitted while compiling.
#[derive(Debug, Clone)]
pub enum CompileEvent {
    /// A compile has started
    Started,

    /// Compile finished; `show_instructions` is set for the first success only
    Succeeded { show_instructions: bool },

    /// Compile failed
    Failed { message: String },
}

/// The bundling collaborator. Implementations package the project's source
/// modules into servable assets; how they do that is their business.
pub trait Bundler: Send + Sync + 'static {
    fn bundle(&self, ctx: &BuildContext) -> Result<BuildOutput, BundleError>;
}

/// Pass-through bundler: sources are served in place during development,
/// and the asset and source trees are copied verbatim for production.
#[derive(Debug, Default)]
pub struct CopyBundler;

impl Bundler for CopyBundler {
    fn bundle(&self, ctx: &BuildContext) -> Result<BuildOutput, BundleError> {
        let start = Instant::now();

        if !ctx.entry.is_file() {
            return Err(BundleError::MissingEntry(ctx.entry.clone()));
        }

        let assets = match ctx.mode {
            BuildMode::Development => count_assets(&ctx.public_dir),
            BuildMode::Production => {
                let output = ctx.output_dir.as_ref().ok_or(BundleError::MissingOutputDir)?;
                let mut copied = copy_tree(&ctx.public_dir, output)?;
                if let Some(src_dir) = ctx.entry.parent() {
                    copied += copy_tree(src_dir, &output.join("src"))?;
                }
                copied
            }
        };

        Ok(BuildOutput {
            assets,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn count_assets(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count()
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize, BundleError> {
    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = match entry.path().strip_prefix(from) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Compiler adapter with lifecycle notifications.
pub struct Compiler {
    bundler: Arc<dyn Bundler>,
    events: broadcast::Sender<CompileEvent>,
    compiled_once: AtomicBool,
}

impl Compiler {
    /// Create a compiler around the given bundler.
    pub fn new(bundler: Arc<dyn Bundler>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            bundler,
            events,
            compiled_once: AtomicBool::new(false),
        }
    }

    /// Subscribe to compile lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CompileEvent> {
        self.events.subscribe()
    }

    /// Run the bundler once, emitting lifecycle events to subscribers.
    pub async fn compile(&self, ctx: BuildContext) -> Result<BuildOutput, BundleError> {
        let _ = self.events.send(CompileEvent::Started);

        let bundler = Arc::clone(&self.bundler);
        let result = tokio::task::spawn_blocking(move || bundler.bundle(&ctx))
            .await
            .map_err(|e| BundleError::Io(std::io::Error::other(e)))?;

        match &result {
            Ok(output) => {
                let first = !self.compiled_once.swap(true, Ordering::SeqCst);
                tracing::debug!(
                    assets = output.assets,
                    duration_ms = output.duration_ms,
                    "compile finished"
                );
                let _ = self.events.send(CompileEvent::Succeeded {
                    show_instructions: first,
                });
            }
            Err(e) => {
                let _ = self.events.send(CompileEvent::Failed {
                    message: e.to_string(),
                });
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn dev_context(root: &Path) -> BuildContext {
        fs::create_dir_all(root.join("public")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("public/index.html"), "<html></html>").unwrap();
        fs::write(root.join("src/index.js"), "console.log('hi');").unwrap();

        BuildContext {
            public_dir: root.join("public"),
            entry: root.join("src/index.js"),
            mode: BuildMode::Development,
            output_dir: None,
        }
    }

    #[tokio::test]
    async fn first_success_flags_instructions() {
        let temp = tempdir().unwrap();
        let ctx = dev_context(temp.path());

        let compiler = Compiler::new(Arc::new(CopyBundler));
        let mut rx = compiler.subscribe();

        compiler.compile(ctx.clone()).await.unwrap();
        assert!(matches!(rx.recv().await, Ok(CompileEvent::Started)));
        assert!(matches!(
            rx.recv().await,
            Ok(CompileEvent::Succeeded {
                show_instructions: true
            })
        ));

        compiler.compile(ctx).await.unwrap();
        assert!(matches!(rx.recv().await, Ok(CompileEvent::Started)));
        assert!(matches!(
            rx.recv().await,
            Ok(CompileEvent::Succeeded {
                show_instructions: false
            })
        ));
    }

    #[tokio::test]
    async fn missing_entry_fails() {
        let temp = tempdir().unwrap();
        let mut ctx = dev_context(temp.path());
        ctx.entry = temp.path().join("src/nope.js");

        let compiler = Compiler::new(Arc::new(CopyBundler));
        let mut rx = compiler.subscribe();

        let result = compiler.compile(ctx).await;
        assert!(matches!(result, Err(BundleError::MissingEntry(_))));

        assert!(matches!(rx.recv().await, Ok(CompileEvent::Started)));
        assert!(matches!(rx.recv().await, Ok(CompileEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn production_build_copies_assets() {
        let temp = tempdir().unwrap();
        let mut ctx = dev_context(temp.path());
        let output = temp.path().join("build");
        ctx.mode = BuildMode::Production;
        ctx.output_dir = Some(output.clone());

        let compiler = Compiler::new(Arc::new(CopyBundler));
        let result = compiler.compile(ctx).await.unwrap();

        assert_eq!(result.assets, 2);
        assert!(output.join("index.html").is_file());
        assert!(output.join("src/index.js").is_file());
    }

    #[tokio::test]
    async fn production_build_requires_output_dir() {
        let temp = tempdir().unwrap();
        let mut ctx = dev_context(temp.path());
        ctx.mode = BuildMode::Production;

        let compiler = Compiler::new(Arc::new(CopyBundler));
        let result = compiler.compile(ctx).await;
        assert!(matches!(result, Err(BundleError::MissingOutputDir)));
    }
}
