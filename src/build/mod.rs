//! Stylesheet build tasks for pixelpipe
//!
//! Turns glob lists of LESS / SCSS sources into CSS files.
//!
//! # Overview
//!
//! A task run consists of:
//! - **Discovery**: Resolve the task's glob list against the project root
//! - **Streaming**: Read each matched file into a [`FileEntry`]
//! - **Compilation**: Hand each entry to a [`StyleCompiler`]
//! - **Output**: Write the CSS under the destination, keeping the path
//!   relative to the glob base
//!
//! # Example
//!
//! ```ignore
//! use pixelpipe::build::{default_registry, BuildContext, Runner};
//! use pixelpipe::config::load_project;
//!
//! let (config, root) = load_project(None)?;
//! let context = BuildContext::new(config, root);
//! let runner = Runner::new(default_registry(&context), context);
//!
//! let report = runner.run_series(&["less", "sass"])?;
//! println!("{}", report.summary());
//! ```

pub mod compiler;
pub mod context;
pub mod discovery;
pub mod result;
pub mod stream;
pub mod task;

pub use compiler::*;
pub use context::*;
pub use discovery::*;
pub use result::*;
pub use stream::*;
pub use task::*;
