//! Development server for stoke projects.
//!
//! Serves project assets with live reload, forwards API requests to a
//! backend declared in package.json, and reports compile status through a
//! broadcast channel the launcher can subscribe to.

pub mod compiler;
pub mod livereload;
pub mod proxy;
pub mod server;
pub mod watcher;

pub use compiler::{
    BuildContext, BuildMode, BuildOutput, BundleError, Bundler, CompileEvent, Compiler, CopyBundler,
};
pub use livereload::{ReloadHub, ReloadMessage};
pub use proxy::{ProxyError, ProxyRules};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
