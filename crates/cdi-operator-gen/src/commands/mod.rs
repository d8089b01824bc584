//! CLI commands

pub mod crd;
pub mod csv;
pub mod group;
pub mod groups;

use console::style;
use std::path::Path;

use crate::output::OutputFormat;

/// Output settings shared by every command
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions<'a> {
    pub format: OutputFormat,
    pub output_dir: Option<&'a Path>,
    pub debug: bool,
}

impl OutputOptions<'_> {
    pub fn debug(&self, message: impl std::fmt::Display) {
        if self.debug {
            eprintln!("{} {}", style("DEBUG").dim(), message);
        }
    }
}
