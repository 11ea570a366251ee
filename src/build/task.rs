//! Named tasks and the runner that executes them.
//!
//! A [`TaskRegistry`] maps task names to boxed [`Task`]s. A [`Runner`]
//! owns a registry plus the [`BuildContext`] and runs tasks by name,
//! printing gulp-style progress lines:
//!
//! ```text
//! [14:02:11] Starting 'sass'...
//! [14:02:11] Finished 'sass' after 38 ms
//! ```

use crate::build::{
    read_sources, source_entries, write_output, BuildContext, CompileError, DiscoveryError, LessCompiler,
    SassCompiler, SassOptions, SeriesReport, SourceSet, StreamError, StyleCompiler, TaskReport,
};
use crate::logging::{format_duration, timestamp};
use crate::watch::{self, ChangeFeed, WatchError, WatchOptions, WatchStats};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Error produced by a task run.
#[derive(Debug, Error)]
pub enum TaskError {
    /// No task registered under this name
    #[error("Task '{0}' is not in the task registry")]
    UnknownTask(String),
    /// Glob list could not be resolved
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Reading a source or writing an output failed
    #[error(transparent)]
    Stream(#[from] StreamError),
    /// A source file failed to compile
    #[error("{}: {source}", .file.display())]
    Compile {
        file: PathBuf,
        #[source]
        source: CompileError,
    },
    /// Watch mode could not start
    #[error(transparent)]
    Watch(#[from] WatchError),
}

impl TaskError {
    /// Source file the error is attributed to, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            TaskError::Compile { file, .. } => Some(file.as_path()),
            TaskError::Stream(e) => Some(e.path.as_path()),
            _ => None,
        }
    }
}

/// A runnable unit of work.
pub trait Task {
    /// One-line description shown by `ppipe tasks`.
    fn description(&self) -> &str;

    /// Run the task to completion.
    fn run(&self, runner: &Runner) -> Result<TaskReport, TaskError>;
}

/// Compile every file matched by a glob list with one compiler.
pub struct CompileTask {
    description: String,
    globs: Vec<String>,
    dest: PathBuf,
    compiler: Box<dyn StyleCompiler>,
}

impl CompileTask {
    pub fn new(
        description: impl Into<String>,
        globs: Vec<String>,
        dest: PathBuf,
        compiler: Box<dyn StyleCompiler>,
    ) -> Self {
        Self { description: description.into(), globs, dest, compiler }
    }
}

impl Task for CompileTask {
    fn description(&self) -> &str {
        &self.description
    }

    fn run(&self, runner: &Runner) -> Result<TaskReport, TaskError> {
        compile_sources(self.compiler.as_ref(), runner.context(), &self.globs, &self.dest)
    }
}

/// Re-run the `[watch]` tasks whenever a watched file changes.
pub struct WatchTask {
    description: String,
}

impl WatchTask {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into() }
    }
}

impl Task for WatchTask {
    fn description(&self) -> &str {
        &self.description
    }

    fn run(&self, runner: &Runner) -> Result<TaskReport, TaskError> {
        let stats = watch_sass_task(runner.context())?;
        tracing::debug!(runs = stats.runs, failures = stats.failures, "watch stopped");
        Ok(TaskReport::new("watch"))
    }
}

/// A task backed by a closure.
pub struct FnTask<F> {
    description: String,
    func: F,
}

impl<F> FnTask<F>
where
    F: Fn(&Runner) -> Result<TaskReport, TaskError>,
{
    pub fn new(description: impl Into<String>, func: F) -> Self {
        Self { description: description.into(), func }
    }
}

impl<F> Task for FnTask<F>
where
    F: Fn(&Runner) -> Result<TaskReport, TaskError>,
{
    fn description(&self) -> &str {
        &self.description
    }

    fn run(&self, runner: &Runner) -> Result<TaskReport, TaskError> {
        (self.func)(runner)
    }
}

/// Name → task map.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Box<dyn Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task, replacing any task with the same name.
    pub fn register(&mut self, name: impl Into<String>, task: impl Task + 'static) {
        self.tasks.insert(name.into(), Box::new(task));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Task> {
        self.tasks.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }

    /// `(name, description)` pairs in sorted order.
    pub fn describe(&self) -> Vec<(&str, &str)> {
        self.tasks.iter().map(|(name, task)| (name.as_str(), task.description())).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Runs registered tasks against a build context.
pub struct Runner {
    registry: TaskRegistry,
    context: BuildContext,
    quiet: bool,
}

impl Runner {
    pub fn new(registry: TaskRegistry, context: BuildContext) -> Self {
        Self { registry, context, quiet: false }
    }

    /// Suppress the Starting/Finished progress lines.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Run one task by name.
    pub fn run(&self, name: &str) -> Result<TaskReport, TaskError> {
        let task = self.registry.get(name).ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;

        self.progress(format_args!("Starting '{}'...", name));
        let start = Instant::now();

        match task.run(self) {
            Ok(mut report) => {
                report.task = name.to_string();
                report.duration = start.elapsed();
                self.progress(format_args!(
                    "Finished '{}' after {}",
                    name,
                    format_duration(report.duration)
                ));
                Ok(report)
            }
            Err(e) => {
                if !self.quiet {
                    eprintln!(
                        "[{}] '{}' errored after {}",
                        timestamp(),
                        name,
                        format_duration(start.elapsed())
                    );
                }
                Err(e)
            }
        }
    }

    /// Run tasks in order, stopping at the first failure.
    ///
    /// Every name is checked before anything runs.
    pub fn run_series<S: AsRef<str>>(&self, names: &[S]) -> Result<SeriesReport, TaskError> {
        if let Some(unknown) = names.iter().find(|n| !self.registry.contains(n.as_ref())) {
            return Err(TaskError::UnknownTask(unknown.as_ref().to_string()));
        }

        let start = Instant::now();
        let mut series = SeriesReport::new();
        for name in names {
            series.add_report(self.run(name.as_ref())?);
        }
        series.total_duration = start.elapsed();
        Ok(series)
    }

    fn progress(&self, line: std::fmt::Arguments<'_>) {
        if !self.quiet {
            println!("[{}] {}", timestamp(), line);
        }
    }
}

/// Discover, read, compile and write one glob list.
///
/// Globs and `dest` are interpreted relative to the project root. Each
/// output lands at `dest/<path relative to glob base>` with the
/// compiler's extension. The first compile error aborts the run.
pub fn compile_sources(
    compiler: &dyn StyleCompiler,
    ctx: &BuildContext,
    globs: &[String],
    dest: &Path,
) -> Result<TaskReport, TaskError> {
    let root = ctx.project_root();
    let files = SourceSet::from_globs(globs)?.discover(root)?;
    let entries =
        if compiler.reads_contents() { read_sources(&files)? } else { source_entries(&files) };
    // `./` components are dropped so reported paths stay clean
    let dest: PathBuf = ctx.resolve_path(dest).components().collect();

    let mut report = TaskReport::new(compiler.name());
    for entry in &entries {
        if compiler.skips_partials() && entry.is_partial() {
            tracing::debug!(file = %entry.path.display(), "skipping partial");
            report.add_skipped(entry.path.clone());
            continue;
        }

        let css = compiler
            .compile(entry)
            .map_err(|source| TaskError::Compile { file: entry.path.clone(), source })?;

        let out = entry.dest_path(&dest, compiler.output_extension());
        write_output(&out, css.as_bytes())?;
        if ctx.is_verbose() {
            println!("  {} -> {}", entry.relative().display(), out.display());
        }
        tracing::debug!(src = %entry.path.display(), out = %out.display(), "compiled");
        report.add_output(out);
    }

    Ok(report)
}

/// SCSS options from the `[sass]` section.
pub fn sass_options(ctx: &BuildContext) -> SassOptions {
    let sass = &ctx.config().sass;
    SassOptions { include_paths: sass.include_paths.clone(), output_style: sass.output_style }
}

/// Compile every `[less]` source into the destination directory.
pub fn run_less_task(ctx: &BuildContext) -> Result<TaskReport, TaskError> {
    let less = &ctx.config().less;
    let compiler = LessCompiler::from_config(less, ctx.resolve_paths(&less.include_paths));
    compile_sources(&compiler, ctx, &less.globs, &less.dest)
}

/// Compile every `[sass]` source with the given options.
///
/// Relative include paths in `options` are resolved against the project root.
pub fn run_sass_task(ctx: &BuildContext, options: &SassOptions) -> Result<TaskReport, TaskError> {
    let sass = &ctx.config().sass;
    let compiler = SassCompiler::new(SassOptions {
        include_paths: ctx.resolve_paths(&options.include_paths),
        output_style: options.output_style,
    });
    compile_sources(&compiler, ctx, &sass.globs, &sass.dest)
}

/// Watch the `[watch]` globs and run the `[watch]` tasks on change.
///
/// Blocks while the watcher is alive.
pub fn watch_sass_task(ctx: &BuildContext) -> Result<WatchStats, TaskError> {
    let options = WatchOptions::from_config(&ctx.config().watch);
    let (guard, feed) = watch::start_watching(ctx.project_root(), &options)?;
    let stats = run_watch_feed(ctx, feed);
    drop(guard);
    Ok(stats)
}

/// Run the `[watch]` tasks once per relevant batch in `feed` until it closes.
pub fn run_watch_feed(ctx: &BuildContext, feed: ChangeFeed) -> WatchStats {
    let options = WatchOptions::from_config(&ctx.config().watch);
    let runner = Runner::new(default_registry(ctx), ctx.clone());
    watch::run_on_changes(&runner, &options, feed)
}

/// Registry holding `less`, `sass` and `sass:watch` built from the context's config.
pub fn default_registry(ctx: &BuildContext) -> TaskRegistry {
    let config = ctx.config();
    let mut registry = TaskRegistry::new();

    let less = LessCompiler::from_config(&config.less, ctx.resolve_paths(&config.less.include_paths));
    registry.register(
        "less",
        CompileTask::new(
            "Compile LESS sources to CSS",
            config.less.globs.clone(),
            config.less.dest.clone(),
            Box::new(less),
        ),
    );

    let sass = SassCompiler::new(SassOptions {
        include_paths: ctx.resolve_paths(&config.sass.include_paths),
        output_style: config.sass.output_style,
    });
    registry.register(
        "sass",
        CompileTask::new(
            "Compile SCSS sources next to their source files",
            config.sass.globs.clone(),
            config.sass.dest.clone(),
            Box::new(sass),
        ),
    );

    registry.register(
        "sass:watch",
        WatchTask::new(format!("Run {} when watched files change", config.watch.tasks.join(", "))),
    );

    registry
}
