use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

fn spawn_shell() -> Child {
    Command::new(env!("CARGO_BIN_EXE_minishell"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn minishell")
}

fn send_sigint(child: &Child) {
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) };
    assert_eq!(rc, 0, "kill failed");
}

#[test]
fn sigint_at_prompt_does_not_exit() {
    let mut child = spawn_shell();
    // Give the shell time to install its handlers and print the prompt.
    thread::sleep(Duration::from_millis(300));
    send_sigint(&child);
    thread::sleep(Duration::from_millis(100));

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "echo ALIVE").expect("write line");
        writeln!(stdin, "exit").expect("write exit");
    }

    let output = child.wait_with_output().expect("wait output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(output.status.success(), "shell did not exit cleanly");
}

#[test]
fn sigint_during_foreground_child_keeps_shell() {
    let mut child = spawn_shell();
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "sleep 1").expect("write line");
    }
    thread::sleep(Duration::from_millis(400));
    send_sigint(&child);

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "echo ALIVE").expect("write line");
        writeln!(stdin, "exit").expect("write exit");
    }

    let output = child.wait_with_output().expect("wait output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(output.status.success());
}

#[test]
fn eof_exits_cleanly() {
    let mut child = spawn_shell();
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "echo BEFORE_EOF").expect("write line");
    }
    drop(child.stdin.take());

    let output = child.wait_with_output().expect("wait output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("BEFORE_EOF"), "stdout was: {stdout}");
    assert!(output.status.success());
}

#[test]
fn exit_stops_reading_input() {
    let mut child = spawn_shell();
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "exit").expect("write exit");
        writeln!(stdin, "echo NEVER").expect("write line");
    }
    let output = child.wait_with_output().expect("wait output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("NEVER"), "stdout was: {stdout}");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn unreadable_input_is_reported_once() {
    let mut child = spawn_shell();
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin.write_all(b"echo \xff\xfe\n").expect("write bytes");
    }
    drop(child.stdin.take());

    let output = child.wait_with_output().expect("wait output");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("Failed to read from stdin").count(),
        1,
        "stderr was: {stderr}"
    );
    assert_eq!(stderr.lines().count(), 1, "stderr was: {stderr}");
    assert_eq!(output.status.code(), Some(1));
}
