//! Required-file checks run before anything is started.

use std::path::PathBuf;

use console::style;

/// Verify that every required file exists.
///
/// Prints a diagnostic naming each missing file and returns false if any
/// are absent; callers must not start a server in that case.
pub fn check_required_files(paths: &[PathBuf]) -> bool {
    let missing: Vec<&PathBuf> = paths.iter().filter(|p| !p.exists()).collect();
    if missing.is_empty() {
        return true;
    }

    eprintln!("{}", style("Could not find a required file.").red());
    for path in missing {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let dir = path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        eprintln!("  {} {}", style("Name:").bold(), style(name).cyan());
        eprintln!("  {} {}", style("Searched in:").bold(), style(dir).cyan());
    }
    false
}
