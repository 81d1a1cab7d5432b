use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;

use crate::error::StageError;

/// How a redirected output file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `>`: create, truncate existing content.
    Truncate,
    /// `>>`: create, keep existing content and append.
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputTarget<'a> {
    pub path: &'a str,
    pub mode: OutputMode,
}

/// At most one input and one output redirection; a later operator of the
/// same direction replaces the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Redirections<'a> {
    pub input: Option<&'a str>,
    pub output: Option<OutputTarget<'a>>,
}

impl<'a> Redirections<'a> {
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none()
    }

    pub fn set_input(&mut self, path: &'a str) {
        self.input = Some(path);
    }

    pub fn set_output(&mut self, path: &'a str, mode: OutputMode) {
        self.output = Some(OutputTarget { path, mode });
    }
}

/// Open a `<` target read-only. Never creates the file.
pub fn open_input(path: &str) -> Result<File, StageError> {
    File::open(path).map_err(|source| redirect_error(path, source))
}

/// Open a `>`/`>>` target, creating it with mode 0644 when missing.
pub fn open_output(target: &OutputTarget<'_>) -> Result<File, StageError> {
    let mut options = OpenOptions::new();
    match target.mode {
        OutputMode::Truncate => options.write(true).truncate(true),
        OutputMode::Append => options.append(true),
    };
    options
        .create(true)
        .mode(0o644)
        .open(target.path)
        .map_err(|source| redirect_error(target.path, source))
}

fn redirect_error(path: &str, source: io::Error) -> StageError {
    StageError::Redirect {
        path: path.to_string(),
        source,
    }
}
