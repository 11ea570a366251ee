//! Source file discovery for the build tasks.
//!
//! Resolves gulp-style glob lists (`"./**/*.scss"`, `"!node_modules/**/*"`)
//! against the project root. Each discovered file remembers the glob base
//! it was matched under so the destination path can keep the layout
//! relative to that base.

use glob::{glob_with, MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Error during source discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
    /// Glob list has no non-negated entry
    NoIncludes,
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
            DiscoveryError::NoIncludes => {
                write!(f, "Glob list contains only negated patterns")
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::InvalidPattern(_, e) => Some(e),
            DiscoveryError::NoIncludes => None,
        }
    }
}

/// Matching rules shared by discovery and the watch filter: `*` and `?`
/// stay within one path component, and wildcards skip dot-files and
/// dot-directories unless the pattern spells the dot out.
pub const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// A file matched by a [`SourceSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (root-joined) path of the file
    pub path: PathBuf,
    /// Glob base the file was matched under
    pub base: PathBuf,
}

impl SourceFile {
    /// Path of the file relative to its glob base.
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }
}

/// An ordered list of include globs plus exclusion patterns.
#[derive(Debug, Clone)]
pub struct SourceSet {
    includes: Vec<String>,
    include_patterns: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl SourceSet {
    /// Build a source set from a glob list; `!`-prefixed entries exclude.
    pub fn from_globs(globs: &[String]) -> Result<Self, DiscoveryError> {
        let mut includes = Vec::new();
        let mut include_patterns = Vec::new();
        let mut excludes = Vec::new();

        for raw in globs {
            match raw.strip_prefix('!') {
                Some(negated) => {
                    let normalized = normalize_pattern(negated);
                    let pattern = Pattern::new(normalized)
                        .map_err(|e| DiscoveryError::InvalidPattern(raw.clone(), e))?;
                    excludes.push(pattern);
                }
                None => {
                    let normalized = normalize_pattern(raw);
                    let pattern = Pattern::new(normalized)
                        .map_err(|e| DiscoveryError::InvalidPattern(raw.clone(), e))?;
                    includes.push(normalized.to_string());
                    include_patterns.push(pattern);
                }
            }
        }

        if includes.is_empty() {
            return Err(DiscoveryError::NoIncludes);
        }

        Ok(Self { includes, include_patterns, excludes })
    }

    /// Include patterns, normalized (no leading `./`).
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Check whether a root-relative path is excluded.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.excludes.iter().any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }

    /// Check whether a path matches the set without touching the filesystem.
    ///
    /// `path` may be absolute (it is made relative to `root`) or already
    /// root-relative.
    pub fn matches(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        if self.is_excluded(relative) {
            return false;
        }
        self.include_patterns.iter().any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }

    /// Discover all regular files matching the set under `root`.
    ///
    /// Files keep the order of the include globs (alphabetical within one
    /// glob); a file matched by several globs is reported once, under the
    /// base of the first glob that matched it. Glob syntax in `root`
    /// itself is taken literally.
    pub fn discover(&self, root: &Path) -> Result<Vec<SourceFile>, DiscoveryError> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        let escaped_root = Pattern::escape(&root.to_string_lossy());

        for include in &self.includes {
            let base = root.join(glob_base(include));
            let pattern_str = format!("{}/{}", escaped_root.trim_end_matches('/'), include);

            let paths = glob_with(&pattern_str, MATCH_OPTIONS)
                .map_err(|e| DiscoveryError::InvalidPattern(include.clone(), e))?;

            let mut matched = Vec::new();
            for entry in paths {
                match entry {
                    Ok(path) => {
                        if !path.is_file() {
                            continue;
                        }
                        let relative = path.strip_prefix(root).unwrap_or(&path);
                        if self.is_excluded(relative) {
                            continue;
                        }
                        matched.push(path);
                    }
                    Err(e) => {
                        // Unreadable entries are skipped, not fatal
                        tracing::warn!("error reading path: {}", e);
                    }
                }
            }

            matched.sort();
            for path in matched {
                if seen.insert(path.clone()) {
                    files.push(SourceFile { path, base: base.clone() });
                }
            }
        }

        Ok(files)
    }
}

/// Strip a leading `./` (possibly repeated) from a glob.
fn normalize_pattern(pattern: &str) -> &str {
    let mut p = pattern;
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p
}

fn is_magic(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Compute the glob base: the leading directories without glob syntax.
///
/// `less/**/*.less` → `less`, `**/*.scss` → ``, `styles/main.less` → `styles`.
pub fn glob_base(pattern: &str) -> PathBuf {
    let pattern = normalize_pattern(pattern);
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();

    let literal = components.iter().take_while(|c| !is_magic(c)).count();
    let take = if literal == components.len() { literal.saturating_sub(1) } else { literal };

    components[..take].iter().collect()
}
