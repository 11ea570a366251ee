//! Watch mode for automatic re-runs on file changes
//!
//! Provides file system watching with debouncing for the `sass:watch` task.
//! Runs happen on the calling thread one after another; changes that arrive
//! while a run is in progress are folded into a single follow-up run.

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use crate::build::{glob_base, DiscoveryError, Runner, SourceSet, TaskError};
use crate::config::schema::WatchConfig;
use crate::logging::{clear_screen, timestamp};

/// Error during watch mode
#[derive(Debug)]
pub enum WatchError {
    /// Failed to initialize file watcher
    WatcherInit(notify::Error),
    /// Failed to add watch path
    WatchPath(PathBuf, notify::Error),
    /// No glob base exists on disk
    SourceNotFound(PathBuf),
    /// Watch globs are invalid
    Discovery(DiscoveryError),
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::WatcherInit(e) => write!(f, "Failed to initialize file watcher: {}", e),
            WatchError::WatchPath(path, e) => {
                write!(f, "Failed to watch {}: {}", path.display(), e)
            }
            WatchError::SourceNotFound(path) => {
                write!(f, "Source directory not found: {}", path.display())
            }
            WatchError::Discovery(e) => write!(f, "Invalid watch globs: {}", e),
        }
    }
}

impl std::error::Error for WatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WatchError::WatcherInit(e) | WatchError::WatchPath(_, e) => Some(e),
            WatchError::Discovery(e) => Some(e),
            WatchError::SourceNotFound(_) => None,
        }
    }
}

/// One debounced batch of changed paths, or a watcher error message.
pub type ChangeBatch = Result<Vec<PathBuf>, String>;

/// Tracks files with errors across runs for recovery detection
#[derive(Debug, Default)]
pub struct ErrorTracker {
    /// Files that failed in the previous run
    files_with_errors: HashSet<PathBuf>,
}

impl ErrorTracker {
    /// Create a new error tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Update tracker with a run outcome, returns list of fixed files
    pub fn update(&mut self, result: &Result<(), TaskError>) -> Vec<PathBuf> {
        let current: HashSet<PathBuf> = match result {
            Err(e) => e.file().map(Path::to_path_buf).into_iter().collect(),
            Ok(()) => HashSet::new(),
        };

        let mut fixed: Vec<PathBuf> = self.files_with_errors.difference(&current).cloned().collect();
        fixed.sort();
        self.files_with_errors = current;
        fixed
    }

    /// Check if there are any tracked errors
    pub fn has_errors(&self) -> bool {
        !self.files_with_errors.is_empty()
    }

    /// Get the number of files with errors
    pub fn error_count(&self) -> usize {
        self.files_with_errors.len()
    }
}

/// Options for watch mode
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Globs whose changes trigger a run
    pub globs: Vec<String>,
    /// Tasks run in series on each change
    pub tasks: Vec<String>,
    /// Debounce delay
    pub debounce: Duration,
    /// Clear terminal before each run
    pub clear_screen: bool,
}

impl WatchOptions {
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            globs: config.globs.clone(),
            tasks: config.tasks.clone(),
            debounce: Duration::from_millis(u64::from(config.debounce_ms)),
            clear_screen: config.clear_screen,
        }
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::from_config(&WatchConfig::default())
    }
}

/// Counters reported when a watch loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchStats {
    /// Change batches received (including irrelevant ones)
    pub batches: usize,
    /// Runs started
    pub runs: usize,
    /// Runs that returned an error
    pub failures: usize,
}

/// Drive runs from a channel of change batches until every sender is gone.
///
/// Paths not matched by `filter` (relative to `root`) are ignored. Once a
/// run finishes, every batch queued during it is drained and, if any of
/// them carried a relevant path, exactly one follow-up run is made.
pub fn watch_loop<F>(
    rx: &Receiver<ChangeBatch>,
    filter: &SourceSet,
    root: &Path,
    mut run: F,
) -> WatchStats
where
    F: FnMut(&[PathBuf]) -> Result<(), TaskError>,
{
    let mut stats = WatchStats::default();
    let mut tracker = ErrorTracker::new();
    let mut pending: Vec<PathBuf> = Vec::new();

    while let Ok(batch) = rx.recv() {
        stats.batches += 1;
        collect_relevant(batch, filter, root, &mut pending);

        while !pending.is_empty() {
            let changed = std::mem::take(&mut pending);
            for path in &changed {
                let shown = path.strip_prefix(root).unwrap_or(path);
                println!("[{}] Changed: {}", timestamp(), shown.display());
            }

            stats.runs += 1;
            let result = run(&changed);
            if result.is_err() {
                stats.failures += 1;
            }
            report_run(&result, &mut tracker);

            while let Ok(batch) = rx.try_recv() {
                stats.batches += 1;
                collect_relevant(batch, filter, root, &mut pending);
            }
        }
    }

    stats
}

fn collect_relevant(batch: ChangeBatch, filter: &SourceSet, root: &Path, pending: &mut Vec<PathBuf>) {
    match batch {
        Ok(paths) => {
            for path in paths {
                if filter.matches(root, &path) && !pending.contains(&path) {
                    pending.push(path);
                }
            }
        }
        Err(e) => {
            // Watcher errors are not fatal
            eprintln!("[{}] Watch error: {}", timestamp(), e);
        }
    }
}

fn report_run(result: &Result<(), TaskError>, tracker: &mut ErrorTracker) {
    for fixed in tracker.update(result) {
        if let Some(name) = fixed.file_name() {
            println!("[{}] Fixed: {}", timestamp(), name.to_string_lossy());
        }
    }
    if let Err(e) = result {
        eprintln!("[{}] Error: {}", timestamp(), e);
    }
}

/// Directories to watch: the existing glob bases of every include.
fn watch_roots(filter: &SourceSet, root: &Path) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for include in filter.includes() {
        let base = root.join(glob_base(include));
        if roots.contains(&base) {
            continue;
        }
        if base.is_dir() {
            roots.push(base);
        } else {
            tracing::warn!(path = %base.display(), "glob base does not exist, not watching it");
        }
    }
    roots
}

/// Keeps the file watcher alive. Dropping it stops event delivery, which
/// ends the matching [`ChangeFeed`] once its queue is drained.
pub struct WatchGuard {
    _debouncer: Debouncer<RecommendedWatcher>,
}

/// Debounced change batches for one project, filtered by the watch globs.
pub struct ChangeFeed {
    rx: Receiver<ChangeBatch>,
    filter: SourceSet,
    root: PathBuf,
}

impl ChangeFeed {
    /// Canonical project root the feed reports paths under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Start watching the glob bases of `options.globs` under `project_root`.
///
/// Missing bases are skipped; if none exist the watch cannot start.
pub fn start_watching(
    project_root: &Path,
    options: &WatchOptions,
) -> Result<(WatchGuard, ChangeFeed), WatchError> {
    let root = project_root
        .canonicalize()
        .map_err(|_| WatchError::SourceNotFound(project_root.to_path_buf()))?;
    let filter = SourceSet::from_globs(&options.globs).map_err(WatchError::Discovery)?;

    let roots = watch_roots(&filter, &root);
    if roots.is_empty() {
        return Err(WatchError::SourceNotFound(root.join(glob_base(&filter.includes()[0]))));
    }

    let (tx, rx) = channel::<ChangeBatch>();
    let mut debouncer = new_debouncer(options.debounce, move |res: DebounceEventResult| {
        let batch = res
            .map(|events| {
                events
                    .into_iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .map(|e| e.path)
                    .collect()
            })
            .map_err(|e| e.to_string());
        // Receiver gone means the loop has ended
        let _ = tx.send(batch);
    })
    .map_err(WatchError::WatcherInit)?;

    for dir in &roots {
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|e| WatchError::WatchPath(dir.clone(), e))?;
        tracing::debug!(path = %dir.display(), "watching");
    }

    Ok((WatchGuard { _debouncer: debouncer }, ChangeFeed { rx, filter, root }))
}

/// Run the option tasks through `runner` for every relevant batch in `feed`.
///
/// Returns once the feed's [`WatchGuard`] is dropped and the queue is empty.
pub fn run_on_changes(runner: &Runner, options: &WatchOptions, feed: ChangeFeed) -> WatchStats {
    println!("[{}] Watching {} for changes...", timestamp(), options.globs.join(", "));

    watch_loop(&feed.rx, &feed.filter, &feed.root, |_changed| {
        if options.clear_screen {
            clear_screen();
        }
        runner.run_series(&options.tasks).map(|_| ())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::CompileError;
    use std::sync::mpsc::Sender;
    use tempfile::TempDir;

    fn scss_filter() -> SourceSet {
        SourceSet::from_globs(&["./**/*.scss".to_string()]).unwrap()
    }

    fn compile_error(file: &str) -> TaskError {
        TaskError::Compile { file: PathBuf::from(file), source: CompileError::Syntax("bad".into()) }
    }

    #[test]
    fn test_watch_options_default() {
        let options = WatchOptions::default();
        assert_eq!(options.globs, vec!["./**/*.scss"]);
        assert_eq!(options.tasks, vec!["sass"]);
        assert_eq!(options.debounce, Duration::from_millis(100));
        assert!(!options.clear_screen);
    }

    #[test]
    fn test_watch_loop_ignores_irrelevant_changes() {
        let (tx, rx) = channel::<ChangeBatch>();
        tx.send(Ok(vec![PathBuf::from("/p/app.css"), PathBuf::from("/p/readme.md")])).unwrap();
        drop(tx);

        let mut runs = 0;
        let stats = watch_loop(&rx, &scss_filter(), Path::new("/p"), |_| {
            runs += 1;
            Ok(())
        });
        assert_eq!(runs, 0);
        assert_eq!(stats.batches, 1);
        assert_eq!(stats.runs, 0);
    }

    #[test]
    fn test_watch_loop_one_change_one_run() {
        let (tx, rx) = channel::<ChangeBatch>();
        tx.send(Ok(vec![PathBuf::from("/p/app.scss"), PathBuf::from("/p/app.scss")])).unwrap();
        drop(tx);

        let mut seen = Vec::new();
        let stats = watch_loop(&rx, &scss_filter(), Path::new("/p"), |changed| {
            seen.push(changed.to_vec());
            Ok(())
        });
        assert_eq!(stats.runs, 1);
        assert_eq!(seen, vec![vec![PathBuf::from("/p/app.scss")]]);
    }

    #[test]
    fn test_watch_loop_coalesces_changes_during_run() {
        let (tx, rx) = channel::<ChangeBatch>();
        tx.send(Ok(vec![PathBuf::from("/p/a.scss")])).unwrap();
        let mut during_run: Option<Sender<ChangeBatch>> = Some(tx.clone());
        drop(tx);

        let mut seen: Vec<Vec<PathBuf>> = Vec::new();
        let stats = watch_loop(&rx, &scss_filter(), Path::new("/p"), |changed| {
            // Two more changes land while the first run is in progress
            if let Some(tx) = during_run.take() {
                tx.send(Ok(vec![PathBuf::from("/p/b.scss")])).unwrap();
                tx.send(Ok(vec![PathBuf::from("/p/c.scss"), PathBuf::from("/p/b.scss")])).unwrap();
            }
            seen.push(changed.to_vec());
            Ok(())
        });

        assert_eq!(stats.runs, 2);
        assert_eq!(seen[0], vec![PathBuf::from("/p/a.scss")]);
        assert_eq!(seen[1], vec![PathBuf::from("/p/b.scss"), PathBuf::from("/p/c.scss")]);
    }

    #[test]
    fn test_watch_loop_keeps_going_after_failure() {
        let (tx, rx) = channel::<ChangeBatch>();
        tx.send(Ok(vec![PathBuf::from("/p/a.scss")])).unwrap();
        tx.send(Err("inotify queue overflow".to_string())).unwrap();
        tx.send(Ok(vec![PathBuf::from("/p/a.scss")])).unwrap();
        drop(tx);

        let mut attempt = 0;
        let stats = watch_loop(&rx, &scss_filter(), Path::new("/p"), |_| {
            attempt += 1;
            if attempt == 1 {
                Err(compile_error("/p/a.scss"))
            } else {
                Ok(())
            }
        });

        assert_eq!(stats.runs, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.batches, 3);
    }

    #[test]
    fn test_error_tracker_detects_fixed_files() {
        let mut tracker = ErrorTracker::new();

        let fixed = tracker.update(&Err(compile_error("a.scss")));
        assert!(fixed.is_empty());
        assert!(tracker.has_errors());
        assert_eq!(tracker.error_count(), 1);

        let fixed = tracker.update(&Err(compile_error("b.scss")));
        assert_eq!(fixed, vec![PathBuf::from("a.scss")]);

        let fixed = tracker.update(&Ok(()));
        assert_eq!(fixed, vec![PathBuf::from("b.scss")]);
        assert!(!tracker.has_errors());
    }

    #[test]
    fn test_error_tracker_ignores_errors_without_file() {
        let mut tracker = ErrorTracker::new();
        tracker.update(&Err(TaskError::UnknownTask("sass".into())));
        assert_eq!(tracker.error_count(), 0);
    }

    #[test]
    fn test_watch_roots_skips_missing_bases() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("scss")).unwrap();

        let filter = SourceSet::from_globs(&[
            "scss/**/*.scss".to_string(),
            "vendor/**/*.scss".to_string(),
            "scss/*.scss".to_string(),
        ])
        .unwrap();
        assert_eq!(watch_roots(&filter, temp.path()), vec![temp.path().join("scss")]);
    }

    #[test]
    fn test_watch_error_source_not_found() {
        let temp = TempDir::new().unwrap();
        let options = WatchOptions { globs: vec!["missing/**/*.scss".to_string()], ..Default::default() };

        let result = start_watching(temp.path(), &options);
        assert!(matches!(result, Err(WatchError::SourceNotFound(_))));
    }

    #[test]
    fn test_feed_closes_when_guard_dropped() {
        let temp = TempDir::new().unwrap();
        let (guard, feed) = start_watching(temp.path(), &WatchOptions::default()).unwrap();
        assert_eq!(feed.root(), temp.path().canonicalize().unwrap());
        drop(guard);

        let stats = watch_loop(&feed.rx, &feed.filter, &feed.root, |_| Ok(()));
        assert_eq!(stats.runs, 0);
    }

    #[test]
    fn test_watch_error_display() {
        let err = WatchError::SourceNotFound(PathBuf::from("/p/scss"));
        assert_eq!(err.to_string(), "Source directory not found: /p/scss");
    }
}
