//! Build context containing configuration and paths for a task run.

use crate::config::PipeConfig;
use std::path::{Path, PathBuf};

/// Build context containing configuration and paths for a build operation.
///
/// Every glob, destination and include path in the configuration is
/// interpreted relative to the project root held here.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: PipeConfig,
    /// Project root directory (where pixelpipe.toml is located)
    project_root: PathBuf,
    /// Whether to run in verbose mode
    verbose: bool,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: PipeConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, verbose: false }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::config::loader::resolve_path(&self.project_root, path)
    }

    /// Resolve a list of paths relative to the project root.
    pub fn resolve_paths(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths.iter().map(|p| self.resolve_path(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;

    #[test]
    fn test_build_context_new() {
        let root = PathBuf::from("/project");
        let ctx = BuildContext::new(default_config(), root.clone());

        assert_eq!(ctx.project_root(), &root);
        assert!(!ctx.is_verbose());
        assert_eq!(ctx.config().less.program, "lessc");
    }

    #[test]
    fn test_build_context_with_verbose() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("/project")).with_verbose(true);
        assert!(ctx.is_verbose());
    }

    #[test]
    fn test_build_context_resolve_path_absolute() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("/project"));
        assert_eq!(ctx.resolve_path(Path::new("/other/path")), PathBuf::from("/other/path"));
    }

    #[test]
    fn test_build_context_resolve_paths() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("/project"));
        let resolved = ctx.resolve_paths(&ctx.config().sass.include_paths);
        assert_eq!(resolved, vec![PathBuf::from("/project/node_modules")]);
    }
}
