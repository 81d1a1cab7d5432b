use crate::redirect::Redirections;

/// One external program within a pipeline.
///
/// `argv` is never empty: stages left without arguments after operator
/// stripping are discarded by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage<'a> {
    pub argv: Vec<&'a str>,
    /// Only ever populated on the final stage.
    pub redirections: Redirections<'a>,
}

impl<'a> Stage<'a> {
    pub fn program(&self) -> &'a str {
        self.argv[0]
    }

    pub fn args(&self) -> &[&'a str] {
        &self.argv[1..]
    }
}

/// Stages connected by `|`, executed as a single logical command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline<'a> {
    pub stages: Vec<Stage<'a>>,
    /// Set by a trailing `&`.
    pub background: bool,
}

impl<'a> Pipeline<'a> {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The command label used for job listings: the first stage's program.
    pub fn label(&self) -> Option<&'a str> {
        self.stages.first().map(Stage::program)
    }
}
