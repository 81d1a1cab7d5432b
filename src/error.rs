use std::io;

use thiserror::Error;

/// Problems found while grouping tokens into pipeline stages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("syntax error: expected filename after '{0}'")]
    MissingTarget(&'static str),

    #[error("syntax error: '{0}' is only allowed at the end of the command line")]
    MisplacedOperator(&'static str),

    #[error("syntax error: redirection without a command")]
    MissingCommand,
}

/// Failures that leave the engine unable to continue.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("fork: {program}: {source}")]
    Fork {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// A single pipeline stage could not be started. Its siblings still run.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{path}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}: command not found")]
    NotFound(String),

    #[error("{program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("no such job")]
    NoSuchJob,

    #[error("waiting for job {id}: {source}")]
    Wait {
        id: usize,
        #[source]
        source: io::Error,
    },

    #[error("resuming job {id}: {source}")]
    Resume {
        id: usize,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("expected argument to \"{0}\"")]
    MissingArgument(&'static str),

    #[error("expected arguments to \"{0}\"")]
    MissingArguments(&'static str),

    #[error("Error: Too many arguments to cd.")]
    TooManyArguments,

    #[error("cd: HOME not set")]
    HomeNotSet,

    #[error("Error: Cannot change directory to '{path}'. {source}.")]
    ChangeDirectory {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Error: Cannot get current working directory. {0}.")]
    CurrentDirectory(#[source] io::Error),

    #[error("Error: Cannot open directory '{path}'. {source}.")]
    OpenDirectory {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{builtin}: invalid variable name '{name}'")]
    InvalidName { builtin: &'static str, name: String },

    #[error("setenv: invalid value for '{name}'")]
    InvalidValue { name: String },

    #[error("unknown builtin: {0}")]
    Unknown(String),

    #[error("{0}: builtin cannot be piped")]
    Piped(String),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors that end the read loop.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("Error: Failed to read from stdin. {0}.")]
    Input(#[source] io::Error),
}
