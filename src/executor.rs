use std::io::{self, Write};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus};

use os_pipe::{PipeReader, PipeWriter};
use tracing::{debug, warn};

use crate::ast::{Pipeline, Stage};
use crate::error::{LaunchError, StageError};
use crate::interrupt::InterruptController;
use crate::job_control::Pid;
use crate::jobs::JobRegistry;
use crate::redirect;

/// Exit code reported for a stage that never started.
pub const EXIT_NOT_STARTED: i32 = 127;

/// What happened to a launched pipeline.
#[derive(Debug, PartialEq, Eq)]
pub enum Launched {
    /// Every stage was waited for; carries the last stage's exit code.
    Foreground { exit_code: i32 },
    /// The pipeline runs on. `job` is `None` when the registry was full.
    Background { job: Option<usize>, pid: Pid },
    /// Nothing was started.
    Skipped,
}

enum SpawnFailure {
    Stage(StageError),
    Fatal(LaunchError),
}

impl From<StageError> for SpawnFailure {
    fn from(err: StageError) -> Self {
        SpawnFailure::Stage(err)
    }
}

/// Start one process per stage, wired stdout-to-stdin through pipes.
///
/// Per-stage failures (bad redirection target, unknown program) are
/// reported to `stderr` and the remaining stages still run. Pipe creation
/// and fork failures abort the launch with a [`LaunchError`].
pub fn launch(
    pipeline: &Pipeline<'_>,
    jobs: &mut JobRegistry,
    interrupts: &InterruptController,
    stderr: &mut dyn Write,
) -> Result<Launched, LaunchError> {
    let Some(label) = pipeline.label() else {
        return Ok(Launched::Skipped);
    };

    debug!(
        stages = pipeline.stages.len(),
        background = pipeline.background,
        label,
        "launching pipeline"
    );
    let children = spawn_stages(pipeline, stderr)?;

    if pipeline.background {
        let pids: Vec<Pid> = children.iter().flatten().map(|c| c.id() as Pid).collect();
        let Some(&pid) = pids.last() else {
            return Ok(Launched::Skipped);
        };
        // Dropping the handles leaves the processes running; the reaper
        // collects them.
        drop(children);
        let job = jobs.register(pids, label);
        return Ok(Launched::Background { job, pid });
    }

    let _foreground = interrupts.foreground();
    let exit_code = wait_all(children);
    debug!(exit_code, "foreground pipeline finished");
    Ok(Launched::Foreground { exit_code })
}

fn spawn_stages(
    pipeline: &Pipeline<'_>,
    stderr: &mut dyn Write,
) -> Result<Vec<Option<Child>>, LaunchError> {
    let count = pipeline.stages.len();

    let mut readers: Vec<Option<PipeReader>> = Vec::with_capacity(count.saturating_sub(1));
    let mut writers: Vec<Option<PipeWriter>> = Vec::with_capacity(count.saturating_sub(1));
    for _ in 1..count {
        let (reader, writer) = os_pipe::pipe().map_err(LaunchError::Pipe)?;
        readers.push(Some(reader));
        writers.push(Some(writer));
    }

    let mut children = Vec::with_capacity(count);
    for (i, stage) in pipeline.stages.iter().enumerate() {
        let stdin = i.checked_sub(1).and_then(|prev| readers[prev].take());
        let stdout = writers.get_mut(i).and_then(Option::take);
        let is_last = i + 1 == count;

        match spawn_stage(stage, stdin, stdout, is_last) {
            Ok(child) => children.push(Some(child)),
            Err(SpawnFailure::Stage(err)) => {
                let _ = writeln!(stderr, "miniShell: {err}");
                children.push(None);
            }
            Err(SpawnFailure::Fatal(err)) => return Err(err),
        }
    }

    // The parent's pipe ends are closed once every stage is forked.
    drop(readers);
    drop(writers);
    Ok(children)
}

fn spawn_stage(
    stage: &Stage<'_>,
    stdin: Option<PipeReader>,
    stdout: Option<PipeWriter>,
    is_last: bool,
) -> Result<Child, SpawnFailure> {
    let mut command = Command::new(stage.program());
    command.args(stage.args());

    if let Some(reader) = stdin {
        command.stdin(reader);
    }
    if let Some(writer) = stdout {
        command.stdout(writer);
    }

    // File redirection on the last stage overrides any pipe wiring.
    if is_last {
        if let Some(path) = stage.redirections.input {
            command.stdin(redirect::open_input(path)?);
        }
        if let Some(target) = &stage.redirections.output {
            command.stdout(redirect::open_output(target)?);
        }
    }

    command
        .spawn()
        .map_err(|source| classify_spawn_error(stage.program(), source))
}

fn classify_spawn_error(program: &str, source: io::Error) -> SpawnFailure {
    match source.raw_os_error() {
        Some(libc::EAGAIN | libc::ENOMEM) => SpawnFailure::Fatal(LaunchError::Fork {
            program: program.to_string(),
            source,
        }),
        _ if source.kind() == io::ErrorKind::NotFound => {
            SpawnFailure::Stage(StageError::NotFound(program.to_string()))
        }
        _ => SpawnFailure::Stage(StageError::Exec {
            program: program.to_string(),
            source,
        }),
    }
}

/// Wait for every started stage; the result is the last stage's code.
fn wait_all(children: Vec<Option<Child>>) -> i32 {
    let mut last = EXIT_NOT_STARTED;
    for child in children {
        last = match child {
            Some(mut child) => match child.wait() {
                Ok(status) => exit_code(status),
                Err(err) => {
                    warn!(%err, pid = child.id(), "wait failed");
                    1
                }
            },
            None => EXIT_NOT_STARTED,
        };
    }
    last
}

/// Shell-style exit code: `128 + N` for a process killed by signal N.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{build, tokenize};

    fn run(line: &str, jobs: &mut JobRegistry) -> (Launched, String) {
        let tokens = tokenize(line);
        let pipeline = build(&tokens).unwrap();
        let interrupts = InterruptController::new();
        let mut stderr = Vec::new();
        let launched = launch(&pipeline, jobs, &interrupts, &mut stderr).unwrap();
        assert!(!interrupts.child_active());
        (launched, String::from_utf8(stderr).unwrap())
    }

    fn run_foreground(line: &str) -> (Launched, String) {
        run(line, &mut JobRegistry::with_capacity(4))
    }

    #[test]
    fn single_stage_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let (launched, _) = run_foreground(&format!("echo hello > {}", out.display()));
        assert_eq!(launched, Launched::Foreground { exit_code: 0 });
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "hello\n");
    }

    #[test]
    fn two_stage_pipe() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        run_foreground(&format!("echo a | tr a b > {}", out.display()));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "b\n");
    }

    #[test]
    fn three_stage_pipe_matches_system_shell() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "pear\napple\nfig\napple\n").unwrap();
        let out = dir.path().join("out.txt");

        run_foreground(&format!(
            "cat {} | sort | uniq > {}",
            input.display(),
            out.display()
        ));

        let expected = Command::new("sh")
            .arg("-c")
            .arg(format!("cat {} | sort | uniq", input.display()))
            .output()
            .unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), expected.stdout);
    }

    #[test]
    fn input_redirection_on_last_stage() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let out = dir.path().join("out.txt");
        std::fs::write(&input, "x\n").unwrap();
        run_foreground(&format!("cat < {} > {}", input.display(), out.display()));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "x\n");
    }

    #[test]
    fn append_preserves_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        run_foreground(&format!("echo one > {}", out.display()));
        run_foreground(&format!("echo two >> {}", out.display()));
        run_foreground(&format!("echo three >> {}", out.display()));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "one\ntwo\nthree\n");
    }

    #[test]
    fn exit_code_of_last_stage() {
        let (launched, _) = run_foreground("true | false");
        assert_eq!(launched, Launched::Foreground { exit_code: 1 });
        let (launched, _) = run_foreground("false | true");
        assert_eq!(launched, Launched::Foreground { exit_code: 0 });
    }

    #[test]
    fn unknown_program_is_reported_and_siblings_run() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let (launched, stderr) = run_foreground(&format!(
            "no_such_program_for_minishell_tests | echo still > {}",
            out.display()
        ));
        assert!(stderr.contains("no_such_program_for_minishell_tests: command not found"));
        assert_eq!(launched, Launched::Foreground { exit_code: 0 });
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "still\n");
    }

    #[test]
    fn unknown_last_stage_exit_code() {
        let (launched, _) = run_foreground("no_such_program_for_minishell_tests");
        assert_eq!(launched, Launched::Foreground { exit_code: EXIT_NOT_STARTED });
    }

    #[test]
    fn missing_input_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let (_, stderr) = run_foreground(&format!("cat < {}", missing.display()));
        assert!(stderr.starts_with("miniShell: "), "stderr was: {stderr}");
        assert!(stderr.contains("missing.txt"));
        assert!(!missing.exists());
    }

    #[test]
    fn background_registers_every_stage() {
        let mut jobs = JobRegistry::with_capacity(4);
        let (launched, _) = run("sleep 0.1 | cat &", &mut jobs);

        let Launched::Background { job: Some(id), pid } = launched else {
            panic!("expected tracked background job, got {launched:?}");
        };
        let job = jobs.get(id).unwrap();
        assert_eq!(job.label, "sleep");
        assert_eq!(job.pid(), pid);
        assert_eq!(job.processes().len(), 2);

        jobs.foreground(id).unwrap();
        assert_eq!(jobs.active().count(), 0);
    }

    #[test]
    fn background_untracked_when_registry_full() {
        let mut jobs = JobRegistry::with_capacity(0);
        let (launched, _) = run("true &", &mut jobs);
        let Launched::Background { job, pid } = launched else {
            panic!("expected background launch, got {launched:?}");
        };
        assert_eq!(job, None);
        crate::job_control::wait_for_pid(pid).unwrap();
    }

    #[test]
    fn empty_pipeline_is_skipped() {
        let (launched, _) = run_foreground("| |");
        assert_eq!(launched, Launched::Skipped);
    }
}
