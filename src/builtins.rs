use std::io::Write;

use crate::error::{BuiltinError, JobError};
use crate::history::History;
use crate::interrupt::InterruptController;
use crate::jobs::JobRegistry;
use crate::listing;

/// The list of all builtin command names.
const BUILTINS: &[&str] = &[
    "cd", "exit", "history", "setenv", "unsetenv", "jobs", "fg", "bg", "pwd", "lf", "lp",
];

#[derive(Debug, PartialEq, Eq)]
pub enum BuiltinAction {
    Continue,
    Exit(i32),
}

/// Shell state a builtin may read or mutate.
pub struct BuiltinContext<'a> {
    pub jobs: &'a mut JobRegistry,
    pub history: &'a History,
    pub interrupts: &'a InterruptController,
}

/// Returns true if the command name is a shell builtin.
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Execute a builtin command, writing output to the provided streams.
///
/// Errors are reported on `stderr`; the shell always continues unless the
/// builtin was `exit`.
pub fn execute(
    name: &str,
    args: &[&str],
    ctx: &mut BuiltinContext<'_>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> BuiltinAction {
    let result = match name {
        "exit" => return BuiltinAction::Exit(0),
        "cd" => builtin_cd(args),
        "history" => ctx.history.write_to(stdout).map_err(BuiltinError::from),
        "setenv" => builtin_setenv(args),
        "unsetenv" => builtin_unsetenv(args),
        "jobs" => ctx.jobs.write_listing(stdout).map_err(BuiltinError::from),
        "fg" => builtin_fg(args, ctx),
        "bg" => builtin_bg(args, ctx),
        "pwd" => builtin_pwd(stdout),
        "lf" => listing::list_files(stdout),
        "lp" => listing::list_processes(stdout),
        _ => Err(BuiltinError::Unknown(name.to_string())),
    };

    if let Err(err) = result {
        let _ = writeln!(stderr, "miniShell: {err}");
    }
    let _ = stdout.flush();
    BuiltinAction::Continue
}

fn builtin_cd(args: &[&str]) -> Result<(), BuiltinError> {
    if args.len() > 1 {
        return Err(BuiltinError::TooManyArguments);
    }

    let target = match args.first() {
        None => home_dir()?,
        Some(arg) => match arg.strip_prefix('~') {
            Some(rest) => format!("{}{rest}", home_dir()?),
            None => arg.to_string(),
        },
    };

    std::env::set_current_dir(&target)
        .map_err(|source| BuiltinError::ChangeDirectory { path: target, source })
}

fn home_dir() -> Result<String, BuiltinError> {
    std::env::var("HOME").map_err(|_| BuiltinError::HomeNotSet)
}

fn builtin_pwd(stdout: &mut dyn Write) -> Result<(), BuiltinError> {
    let cwd = std::env::current_dir().map_err(BuiltinError::CurrentDirectory)?;
    writeln!(stdout, "{}", cwd.display())?;
    Ok(())
}

fn builtin_setenv(args: &[&str]) -> Result<(), BuiltinError> {
    let (Some(name), Some(value)) = (args.first(), args.get(1)) else {
        return Err(BuiltinError::MissingArguments("setenv"));
    };
    check_variable_name("setenv", name)?;
    if value.contains('\0') {
        return Err(BuiltinError::InvalidValue { name: name.to_string() });
    }
    // SAFETY: the environment is only touched from the main thread. The
    // SIGINT and SIGCHLD handlers never read it.
    unsafe { std::env::set_var(name, value) };
    Ok(())
}

fn builtin_unsetenv(args: &[&str]) -> Result<(), BuiltinError> {
    let Some(name) = args.first() else {
        return Err(BuiltinError::MissingArgument("unsetenv"));
    };
    check_variable_name("unsetenv", name)?;
    // SAFETY: see builtin_setenv.
    unsafe { std::env::remove_var(name) };
    Ok(())
}

/// `set_var` panics on these, so they are rejected up front.
fn check_variable_name(builtin: &'static str, name: &str) -> Result<(), BuiltinError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(BuiltinError::InvalidName {
            builtin,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn builtin_fg(args: &[&str], ctx: &mut BuiltinContext<'_>) -> Result<(), BuiltinError> {
    let id = job_id(args, "fg")?;
    let _foreground = ctx.interrupts.foreground();
    ctx.jobs.foreground(id)?;
    Ok(())
}

fn builtin_bg(args: &[&str], ctx: &mut BuiltinContext<'_>) -> Result<(), BuiltinError> {
    let id = job_id(args, "bg")?;
    ctx.jobs.resume(id)?;
    Ok(())
}

/// Parse the 1-based job index argument. Anything unparseable cannot name
/// a job.
fn job_id(args: &[&str], builtin: &'static str) -> Result<usize, BuiltinError> {
    let arg = args.first().ok_or(BuiltinError::MissingArgument(builtin))?;
    arg.parse::<usize>()
        .map_err(|_| BuiltinError::Job(JobError::NoSuchJob))
}
