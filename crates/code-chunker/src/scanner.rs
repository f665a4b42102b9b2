use crate::config::ChunkerConfig;
use crate::error::ChunkerError;
use crate::language::Language;
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Project-level ignore file, same syntax as `.gitignore`
pub const IGNORE_FILE_NAME: &str = ".codeqaignore";

/// An eligible file found under the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Root-relative path with `/` separators
    pub relative: String,
    pub size: u64,
}

/// Files found by a scan plus the entries that could not be read
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: Vec<SourceFile>,
    pub errors: Vec<ChunkerError>,
}

/// Scanner for finding source files in a project
pub struct FileScanner {
    root: PathBuf,
    max_file_bytes: u64,
    extra_ignored_dirs: Vec<String>,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>, config: &ChunkerConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_file_bytes: config.max_file_bytes,
            extra_ignored_dirs: config
                .extra_ignored_dirs
                .iter()
                .map(|dir| dir.to_lowercase())
                .collect(),
        }
    }

    /// Scan directory for eligible files (.gitignore and .codeqaignore aware)
    pub fn scan(&self) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        let root = self.root.clone();
        let extra = self.extra_ignored_dirs.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .add_custom_ignore_filename(IGNORE_FILE_NAME);
        builder.filter_entry(move |entry| !is_ignored_scope(entry.path(), &root, &extra));

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Failed to read entry: {e}");
                    outcome
                        .errors
                        .push(ChunkerError::discovery(self.root.clone(), e));
                    continue;
                }
            };

            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let path = entry.path();
            if is_noise_file(path) {
                log::debug!("Skipping noisy artifact {}", path.display());
                continue;
            }
            if Language::from_path(path) == Language::Unknown {
                continue;
            }

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    log::warn!("Failed to stat {}: {e}", path.display());
                    outcome.errors.push(ChunkerError::discovery(path, e));
                    continue;
                }
            };
            if size > self.max_file_bytes {
                log::debug!(
                    "Skipping large file {} ({} bytes > {})",
                    path.display(),
                    size,
                    self.max_file_bytes
                );
                continue;
            }

            outcome.files.push(SourceFile {
                path: path.to_path_buf(),
                relative: relative_path(&self.root, path),
                size,
            });
        }

        outcome.files.sort_by(|a, b| a.relative.cmp(&b.relative));
        log::info!("Found {} source files", outcome.files.len());
        outcome
    }
}

/// Root-relative path joined with `/`
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_ignored_scope(path: &Path, root: &Path, extra: &[String]) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| {
        let Component::Normal(name) = component else {
            return false;
        };
        let lowered = name.to_string_lossy().to_lowercase();
        IGNORED_SCOPES.contains(&lowered.as_str()) || extra.iter().any(|dir| dir == &lowered)
    })
}

fn is_noise_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    NOISE_FILE_NAMES
        .iter()
        .any(|candidate| name.eq_ignore_ascii_case(candidate))
        || name.ends_with(".min.js")
        || name.ends_with(".min.css")
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".codeqa",
    // caches / builds
    ".cache",
    "node_modules",
    ".next",
    ".turbo",
    ".nuxt",
    ".svelte-kit",
    "build",
    "dist",
    "out",
    "coverage",
    "target",
    ".venv",
    "venv",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".gradle",
    // vendored code
    "vendor",
    "third_party",
    "third-party",
];

const NOISE_FILE_NAMES: &[&str] = &[
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "cargo.lock",
    "poetry.lock",
    "composer.lock",
    "gemfile.lock",
    "go.sum",
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn scan(root: &Path, config: &ChunkerConfig) -> Vec<String> {
        FileScanner::new(root, config)
            .scan()
            .files
            .into_iter()
            .map(|f| f.relative)
            .collect()
    }

    #[test]
    fn skips_ignored_dirs_noise_and_unknown_extensions() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "src/main.rs", "fn main() {}");
        write(root, "README.md", "# demo");
        write(root, "node_modules/pkg/index.js", "module.exports = 1;");
        write(root, "target/debug/build.rs", "fn x() {}");
        write(root, "package-lock.json", "{}");
        write(root, "logo.png", "png");
        write(root, ".hidden/secret.rs", "fn s() {}");

        assert_eq!(
            scan(root, &ChunkerConfig::default()),
            vec!["README.md".to_string(), "src/main.rs".to_string()]
        );
    }

    #[test]
    fn honors_gitignore_without_repository_and_project_ignore_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, ".gitignore", "generated/\n");
        write(root, IGNORE_FILE_NAME, "*.sql\n");
        write(root, "generated/api.ts", "export const a = 1;");
        write(root, "schema.sql", "select 1;");
        write(root, "app.py", "print('hi')");

        assert_eq!(scan(root, &ChunkerConfig::default()), vec!["app.py".to_string()]);
    }

    #[test]
    fn applies_extra_ignored_dirs_and_size_limit() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "fixtures/data.json", "{}");
        write(root, "src/big.rs", &"x".repeat(64));
        write(root, "src/small.rs", "fn a() {}");

        let config = ChunkerConfig {
            max_file_bytes: 32,
            extra_ignored_dirs: vec!["Fixtures".to_string()],
            ..ChunkerConfig::default()
        };

        assert_eq!(scan(root, &config), vec!["src/small.rs".to_string()]);
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_path(root, Path::new("/repo/src/a/b.rs")),
            "src/a/b.rs"
        );
    }
}
