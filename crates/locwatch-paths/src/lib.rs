use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("home directory not found; set the $HOME environment variable")]
    HomeNotFound,
}

/// Centralized path construction for the `~/.locwatch/` directory layout.
///
/// Single source of truth for every path under `~/.locwatch/`. Use `resolve()` in
/// production code and `from_dir()` in tests.
#[derive(Debug, Clone)]
pub struct LocwatchPaths {
    base_dir: PathBuf,
}

impl LocwatchPaths {
    /// Resolve paths from the user's home directory (`~/.locwatch`).
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeNotFound)?;
        Ok(Self {
            base_dir: home.join(".locwatch"),
        })
    }

    /// Create paths from an explicit base directory. Use in tests.
    pub fn from_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// The base `~/.locwatch` directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // --- Top-level subdirectories ---

    /// Root of the file-backed key/value store (query cache, visibility prefs).
    pub fn store_dir(&self) -> PathBuf {
        self.base_dir.join("store")
    }

    // --- Top-level files ---

    pub fn user_config(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    // --- Static helpers (no self) ---

    /// Project-level config: `<project_root>/.locwatch/config.toml`.
    pub fn project_config(project_root: &Path) -> PathBuf {
        project_root.join(".locwatch").join("config.toml")
    }

    /// File holding a single store record: `<store_root>/<namespace>/<key>.json`.
    pub fn store_record_file(store_root: &Path, namespace: &str, key: &str) -> PathBuf {
        store_root
            .join(sanitize_component(namespace))
            .join(format!("{}.json", sanitize_component(key)))
    }
}

/// Make an arbitrary key safe to use as a single path component.
///
/// Store keys look like `LocationWorkspace:my-loc` or `/base:hidden-repo-keys`,
/// so separators and colons are flattened to `_`.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        format!("_{cleaned}")
    } else {
        cleaned
    }
}
