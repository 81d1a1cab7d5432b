use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::ast::Pipeline;
use crate::builtins::{self, BuiltinAction, BuiltinContext};
use crate::config::ShellConfig;
use crate::error::{BuiltinError, LaunchError, ShellError};
use crate::executor::{self, Launched};
use crate::history::History;
use crate::interrupt::{InterruptController, InterruptOrigin};
use crate::jobs::JobRegistry;
use crate::reaper::Reaper;
use crate::{parser, prompt, redirect};

/// Whether the read loop keeps going after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// Process-wide interpreter state: everything that outlives a single line.
pub struct Shell {
    jobs: JobRegistry,
    history: History,
    interrupts: InterruptController,
    reaper: Reaper,
    color: bool,
}

impl Shell {
    pub fn new(config: &ShellConfig, interrupts: InterruptController, reaper: Reaper) -> Self {
        Self {
            jobs: JobRegistry::with_capacity(config.job_capacity),
            history: History::with_capacity(config.history_capacity),
            interrupts,
            reaper,
            color: prompt::color_enabled(),
        }
    }

    /// Read-eval loop. Returns the status to exit with.
    pub fn run(&mut self) -> Result<i32, ShellError> {
        let stdin = io::stdin();
        let mut line = String::new();

        loop {
            if self.interrupts.take() == Some(InterruptOrigin::Prompt) {
                println!();
            }
            self.print_prompt();

            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => {
                    println!();
                    return Ok(0);
                }
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(ShellError::Input(err)),
            }

            let input = line.trim_end_matches(['\n', '\r']);
            let flow = self.execute_line(input, &mut io::stdout(), &mut io::stderr())?;
            if let Flow::Exit(code) = flow {
                return Ok(code);
            }
        }
    }

    /// Evaluate one line of input.
    ///
    /// Terminated background children are reconciled first, so `jobs`,
    /// `fg`, and `bg` never see a job that has already exited.
    pub fn execute_line(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<Flow, LaunchError> {
        let reaped = self.reaper.reconcile(&mut self.jobs);
        if reaped > 0 {
            debug!(reaped, "reconciled terminated children");
        }

        let tokens = parser::tokenize(line);
        if tokens.is_empty() {
            return Ok(Flow::Continue);
        }
        self.history.record(line);

        let pipeline = match parser::build(&tokens) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                let _ = writeln!(stderr, "miniShell: {err}");
                return Ok(Flow::Continue);
            }
        };
        if pipeline.is_empty() {
            return Ok(Flow::Continue);
        }

        if builtins::is_builtin(pipeline.stages[0].program()) {
            return Ok(self.run_builtin(&pipeline, stdout, stderr));
        }

        match executor::launch(&pipeline, &mut self.jobs, &self.interrupts, stderr)? {
            Launched::Background { job: Some(id), pid } => {
                let _ = writeln!(stdout, "[{id}] {pid}");
            }
            Launched::Background { job: None, pid } => {
                debug!(pid, "background pipeline not tracked");
            }
            Launched::Foreground { exit_code } => {
                debug!(exit_code, "command finished");
            }
            Launched::Skipped => {}
        }
        let _ = stdout.flush();
        Ok(Flow::Continue)
    }

    /// Builtins run in-process. A `>`/`>>` on the command captures their
    /// output; `<` and `&` have no effect on them.
    fn run_builtin(
        &mut self,
        pipeline: &Pipeline<'_>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Flow {
        let stage = &pipeline.stages[0];
        let name = stage.program();
        if pipeline.stages.len() > 1 {
            let _ = writeln!(stderr, "miniShell: {}", BuiltinError::Piped(name.to_string()));
            return Flow::Continue;
        }

        let mut ctx = BuiltinContext {
            jobs: &mut self.jobs,
            history: &self.history,
            interrupts: &self.interrupts,
        };
        let action = match &stage.redirections.output {
            Some(target) => match redirect::open_output(target) {
                Ok(mut file) => builtins::execute(name, stage.args(), &mut ctx, &mut file, stderr),
                Err(err) => {
                    let _ = writeln!(stderr, "miniShell: {err}");
                    return Flow::Continue;
                }
            },
            None => builtins::execute(name, stage.args(), &mut ctx, stdout, stderr),
        };

        match action {
            BuiltinAction::Continue => Flow::Continue,
            BuiltinAction::Exit(code) => Flow::Exit(code),
        }
    }

    fn print_prompt(&self) {
        let cwd = match std::env::current_dir() {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("miniShell: {}", BuiltinError::CurrentDirectory(err));
                None
            }
        };
        print!("{}", prompt::render(cwd.as_deref(), self.color));
        let _ = io::stdout().flush();
    }
}
