//! Pixelpipe - stylesheet build tasks and image canvas demos
//!
//! This library provides functionality to:
//! - Compile LESS and SCSS sources matched by gulp-style glob lists
//! - Re-run compile tasks when watched files change
//! - Build in-memory image canvases and encode them as GIF, PNG, JPEG or SVG

pub mod build;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod demos;
pub mod logging;
pub mod watch;
