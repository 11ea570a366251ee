//! Build task integration tests
//!
//! Runs the `less` and `sass` tasks against scratch projects and checks
//! the written CSS, the series semantics of the runner, and config
//! discovery from the working directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

use pixelpipe::build::{
    default_registry, run_sass_task, run_watch_feed, sass_options, watch_sass_task, BuildContext,
    Runner, TaskError,
};
use pixelpipe::config::{default_config, load_project, PipeConfig};
use pixelpipe::watch::{start_watching, WatchError, WatchOptions};

// ============================================================================
// Test Utilities
// ============================================================================

/// Create a test file with content.
fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn runner_for(root: &Path, config: PipeConfig) -> Runner {
    let ctx = BuildContext::new(config, root.to_path_buf());
    Runner::new(default_registry(&ctx), ctx).with_quiet(true)
}

/// A scratch project shaped like a typical theme repository.
fn sass_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "style.scss", "@import 'base';\nbody { .wrap { width: 100%; } }\n");
    create_test_file(temp.path(), "_base.scss", "$fg: #333;\nhtml { color: $fg; }\n");
    create_test_file(temp.path(), "admin/admin.scss", "@import 'theme/palette';\n.admin { color: $accent; }\n");
    create_test_file(temp.path(), "node_modules/theme/_palette.scss", "$accent: #00ff00;\n");
    create_test_file(temp.path(), "node_modules/theme/theme.scss", ".lib { color: red; }\n");
    temp
}

// ============================================================================
// sass
// ============================================================================

#[test]
fn test_sass_writes_sibling_css_outside_node_modules() {
    let temp = sass_project();
    let runner = runner_for(temp.path(), default_config());

    let report = runner.run("sass").unwrap();
    assert_eq!(report.task, "sass");
    assert_eq!(report.outputs.len(), 2);
    assert_eq!(report.skipped.len(), 1);

    let style = fs::read_to_string(temp.path().join("style.css")).unwrap();
    assert!(style.contains("html"));
    assert!(style.contains("body .wrap"));

    let admin = fs::read_to_string(temp.path().join("admin/admin.css")).unwrap();
    assert!(admin.contains("#00ff00"));

    assert!(!temp.path().join("node_modules/theme/theme.css").exists());
    assert!(!temp.path().join("_base.css").exists());
}

#[test]
fn test_sass_is_idempotent() {
    let temp = sass_project();
    let runner = runner_for(temp.path(), default_config());

    runner.run("sass").unwrap();
    let first = fs::read(temp.path().join("style.css")).unwrap();
    let second_report = runner.run("sass").unwrap();
    let second = fs::read(temp.path().join("style.css")).unwrap();

    assert_eq!(first, second);
    assert_eq!(second_report.outputs.len(), 2);
}

#[test]
fn test_sass_compressed_from_config() {
    let temp = sass_project();
    let mut config = default_config();
    config.sass.output_style = pixelpipe::config::OutputStyle::Compressed;
    let ctx = BuildContext::new(config, temp.path().to_path_buf());

    run_sass_task(&ctx, &sass_options(&ctx)).unwrap();
    let style = fs::read_to_string(temp.path().join("style.css")).unwrap();
    assert!(style.contains("body .wrap{width:100%}"));
}

#[test]
fn test_sass_error_reports_file() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "a.scss", ".a { color: red; }\n");
    create_test_file(temp.path(), "b.scss", ".b { color: $missing; }\n");
    let runner = runner_for(temp.path(), default_config());

    let err = runner.run("sass").unwrap_err();
    match err {
        TaskError::Compile { ref file, .. } => assert!(file.ends_with("b.scss")),
        other => panic!("expected compile error, got {:?}", other),
    }
}

// ============================================================================
// less (a shell command stands in for lessc)
// ============================================================================

#[cfg(unix)]
#[test]
fn test_less_writes_css_under_dest() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "less/site.less", ".site { margin: 0; }\n");
    create_test_file(temp.path(), "less/pages/home.less", ".home { padding: 0; }\n");
    create_test_file(temp.path(), "elsewhere/skip.less", ".skip {}\n");

    let mut config = default_config();
    config.less.program = "cat".to_string();
    let runner = runner_for(temp.path(), config);

    let report = runner.run("less").unwrap();
    assert_eq!(report.outputs.len(), 2);
    assert_eq!(fs::read_to_string(temp.path().join("css/site.css")).unwrap(), ".site { margin: 0; }\n");
    assert!(temp.path().join("css/pages/home.css").exists());
    assert!(!temp.path().join("css/skip.css").exists());
}

#[cfg(unix)]
#[test]
fn test_less_compiler_failure_fails_task() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "less/site.less", ".site {\n");

    let mut config = default_config();
    config.less.program = "sh".to_string();
    config.less.args = vec!["-c".to_string(), "echo 'Unrecognised input' >&2; exit 1".to_string()];
    let runner = runner_for(temp.path(), config);

    let err = runner.run("less").unwrap_err();
    assert!(err.to_string().contains("Unrecognised input"));
    assert!(!temp.path().join("css/site.css").exists());
}

// ============================================================================
// Runner
// ============================================================================

#[test]
fn test_series_runs_in_order() {
    let temp = sass_project();
    let runner = runner_for(temp.path(), default_config());

    // No less sources: `less` succeeds with nothing to do
    let series = runner.run_series(&["less", "sass"]).unwrap();
    let names: Vec<_> = series.tasks.iter().map(|t| t.task.as_str()).collect();
    assert_eq!(names, vec!["less", "sass"]);
    assert_eq!(series.all_outputs().len(), 2);
}

#[test]
fn test_series_stops_after_failure() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "broken.scss", ".a { color: $nope; }\n");
    create_test_file(temp.path(), "less/site.less", ".site {}\n");

    let mut config = default_config();
    config.less.program = "definitely-not-a-real-lessc-binary".to_string();
    let runner = runner_for(temp.path(), config);

    assert!(runner.run_series(&["sass", "less"]).is_err());
    assert!(!temp.path().join("css").exists());
}

#[test]
fn test_unknown_task_runs_nothing() {
    let temp = sass_project();
    let runner = runner_for(temp.path(), default_config());

    let err = runner.run_series(&["sass", "styles"]).unwrap_err();
    assert!(matches!(err, TaskError::UnknownTask(ref n) if n == "styles"));
    assert!(!temp.path().join("style.css").exists());
}

#[test]
fn test_registry_descriptions() {
    let temp = TempDir::new().unwrap();
    let ctx = BuildContext::new(default_config(), temp.path().to_path_buf());
    let registry = default_registry(&ctx);

    let described = registry.describe();
    assert_eq!(described.len(), 3);
    assert!(described.iter().all(|(_, d)| !d.is_empty()));
    assert!(registry.get("sass:watch").unwrap().description().contains("sass"));
}

// ============================================================================
// sass:watch
// ============================================================================

#[test]
fn test_watch_runs_sass_once_per_change() {
    let temp = TempDir::new().unwrap();
    let ctx = BuildContext::new(default_config(), temp.path().to_path_buf());

    let options = WatchOptions::from_config(&ctx.config().watch);
    let (guard, feed) = start_watching(temp.path(), &options).unwrap();
    let watch_ctx = ctx.clone();
    let handle = std::thread::spawn(move || run_watch_feed(&watch_ctx, feed));

    create_test_file(temp.path(), "app.scss", ".app { .title { color: red; } }\n");

    let css = temp.path().join("app.css");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !css.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(css.exists(), "sass did not run after the change");
    // Let the events caused by writing app.css arrive before shutting down
    std::thread::sleep(Duration::from_millis(400));

    drop(guard);
    let stats = handle.join().unwrap();
    assert_eq!(stats.runs, 1);
    assert_eq!(stats.failures, 0);
    assert!(fs::read_to_string(&css).unwrap().contains(".app .title"));
}

#[test]
fn test_watch_sass_task_needs_existing_base() {
    let temp = TempDir::new().unwrap();
    let mut config = default_config();
    config.watch.globs = vec!["./scss/**/*.scss".to_string()];
    let ctx = BuildContext::new(config, temp.path().to_path_buf());

    let err = watch_sass_task(&ctx).unwrap_err();
    assert!(matches!(err, TaskError::Watch(WatchError::SourceNotFound(_))));
}

// ============================================================================
// Config discovery
// ============================================================================

#[test]
#[serial_test::serial]
fn test_load_project_finds_config_from_cwd() {
    let temp = TempDir::new().unwrap();
    create_test_file(
        temp.path(),
        "pixelpipe.toml",
        "[sass]\nglobs = [\"scss/**/*.scss\"]\ndest = \"public/css\"\n",
    );
    let nested = temp.path().join("scss/deep");
    fs::create_dir_all(&nested).unwrap();
    create_test_file(temp.path(), "scss/app.scss", ".app { color: red; }\n");

    let original = std::env::current_dir().unwrap();
    std::env::set_current_dir(&nested).unwrap();
    let loaded = load_project(None);
    std::env::set_current_dir(original).unwrap();

    let (config, root) = loaded.unwrap();
    assert_eq!(root.canonicalize().unwrap(), temp.path().canonicalize().unwrap());

    let runner = runner_for(&root, config);
    runner.run("sass").unwrap();
    assert!(root.join("public/css/app.css").exists());
}
