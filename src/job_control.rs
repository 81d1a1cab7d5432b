use std::io;

pub(crate) type Pid = libc::pid_t;

/// Convert a raw `waitpid` status into shell exit-code semantics
/// (`128 + N` for a process killed by signal N).
pub(crate) fn exit_code_from_wait_status(raw_status: libc::c_int) -> Option<i32> {
    if unsafe { libc::WIFEXITED(raw_status) } {
        return Some(unsafe { libc::WEXITSTATUS(raw_status) });
    }
    if unsafe { libc::WIFSIGNALED(raw_status) } {
        return Some(128 + unsafe { libc::WTERMSIG(raw_status) });
    }
    None
}

/// Block until `pid` terminates.
///
/// Returns `Ok(None)` when the process is no longer our child (already
/// reaped elsewhere), which callers treat as "already exited".
pub(crate) fn wait_for_pid(pid: Pid) -> io::Result<Option<i32>> {
    let mut raw_status: libc::c_int = 0;

    loop {
        let rc = unsafe { libc::waitpid(pid, &mut raw_status, 0) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::ECHILD) => return Ok(None),
                _ => return Err(err),
            }
        }

        if let Some(code) = exit_code_from_wait_status(raw_status) {
            return Ok(Some(code));
        }
    }
}

/// Collect one terminated child without blocking.
///
/// `Ok(None)` means no child has exited since the last call, or there are
/// no children left at all.
pub(crate) fn reap_any() -> io::Result<Option<(Pid, i32)>> {
    let mut raw_status: libc::c_int = 0;

    loop {
        let rc = unsafe { libc::waitpid(-1, &mut raw_status, libc::WNOHANG) };
        if rc > 0 {
            let code = exit_code_from_wait_status(raw_status).unwrap_or(1);
            return Ok(Some((rc, code)));
        }
        if rc == 0 {
            return Ok(None);
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) => continue,
            Some(libc::ECHILD) => return Ok(None),
            _ => return Err(err),
        }
    }
}

/// Deliver `SIGCONT` to a single process.
pub(crate) fn send_continue(pid: Pid) -> io::Result<()> {
    if pid <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid process id",
        ));
    }

    loop {
        let rc = unsafe { libc::kill(pid, libc::SIGCONT) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}
