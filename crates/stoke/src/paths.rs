//! Well-known locations inside a project.

use std::path::{Path, PathBuf};

/// Fixed paths the tooling expects under the project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub public_dir: PathBuf,
    pub index_html: PathBuf,
    pub entry_js: PathBuf,
    pub package_json: PathBuf,
    pub build_dir: PathBuf,
}

impl ProjectPaths {
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            public_dir: root.join("public"),
            index_html: root.join("public").join("index.html"),
            entry_js: root.join("src").join("index.js"),
            package_json: root.join("package.json"),
            build_dir: root.join("build"),
        }
    }

    /// Files that must exist before the dev server or a build may start.
    pub fn required_files(&self) -> Vec<PathBuf> {
        vec![self.index_html.clone(), self.entry_js.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_paths_from_root() {
        let paths = ProjectPaths::from_root("/proj");

        assert_eq!(paths.index_html, PathBuf::from("/proj/public/index.html"));
        assert_eq!(paths.entry_js, PathBuf::from("/proj/src/index.js"));
        assert_eq!(paths.build_dir, PathBuf::from("/proj/build"));
        assert_eq!(paths.required_files().len(), 2);
    }
}
