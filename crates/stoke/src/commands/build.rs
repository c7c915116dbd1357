//! Production build command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use console::style;
use stoke_server::{BuildContext, BuildMode, Compiler, CopyBundler};

use crate::env::Environment;
use crate::files::check_required_files;
use crate::paths::ProjectPaths;

/// Run the build command.
pub async fn run(output: Option<PathBuf>) -> Result<()> {
    let _env = Environment::load("production");
    let paths = ProjectPaths::from_root(".");

    if !check_required_files(&paths.required_files()) {
        std::process::exit(1);
    }

    println!("Creating an optimized production build...");

    let output_dir = output.unwrap_or_else(|| paths.build_dir.clone());
    let ctx = BuildContext {
        public_dir: paths.public_dir.clone(),
        entry: paths.entry_js.clone(),
        mode: BuildMode::Production,
        output_dir: Some(output_dir.clone()),
    };

    let compiler = Compiler::new(Arc::new(CopyBundler));
    let result = compiler.compile(ctx).await?;

    println!("{}", style("Compiled successfully.").green());
    println!();
    println!(
        "Wrote {} assets to {} in {}ms.",
        result.assets,
        style(output_dir.display().to_string()).cyan(),
        result.duration_ms
    );

    Ok(())
}
