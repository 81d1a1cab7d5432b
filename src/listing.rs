//! `lf` and `lp`: directory and process listings.

use std::ffi::CStr;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::BuiltinError;

const PROC_ROOT: &str = "/proc";
const UNKNOWN_USER: &str = "unknown";

/// `lf`: non-hidden entries of the working directory, sorted by name.
pub fn list_files(stdout: &mut dyn Write) -> Result<(), BuiltinError> {
    let cwd = std::env::current_dir().map_err(BuiltinError::CurrentDirectory)?;
    write_visible_entries(&cwd, stdout)
}

fn write_visible_entries(dir: &Path, stdout: &mut dyn Write) -> Result<(), BuiltinError> {
    let entries = fs::read_dir(dir).map_err(|source| BuiltinError::OpenDirectory {
        path: dir.display().to_string(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();

    for name in names {
        writeln!(stdout, "{name}")?;
    }
    Ok(())
}

/// `lp`: one `<pid> <user> <command line>` line per process in `/proc`.
pub fn list_processes(stdout: &mut dyn Write) -> Result<(), BuiltinError> {
    let entries = fs::read_dir(PROC_ROOT).map_err(|source| BuiltinError::OpenDirectory {
        path: PROC_ROOT.to_string(),
        source,
    })?;

    let mut pids: Vec<u32> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
        .collect();
    pids.sort_unstable();

    for pid in pids {
        let dir = Path::new(PROC_ROOT).join(pid.to_string());
        // Processes can exit between the directory scan and these reads.
        let cmdline = fs::read(dir.join("cmdline"))
            .map(|bytes| format_cmdline(&bytes))
            .unwrap_or_default();
        let user = fs::read_to_string(dir.join("status"))
            .ok()
            .and_then(|status| parse_uid(&status))
            .and_then(user_name)
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        writeln!(stdout, "{pid} {user} {cmdline}")?;
    }
    Ok(())
}

/// `/proc/<pid>/cmdline` separates arguments with NUL bytes.
fn format_cmdline(raw: &[u8]) -> String {
    raw.split(|byte| *byte == 0)
        .filter(|arg| !arg.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Real uid from the `Uid:` line of `/proc/<pid>/status`.
fn parse_uid(status: &str) -> Option<libc::uid_t> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

fn user_name(uid: libc::uid_t) -> Option<String> {
    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    let mut passwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    loop {
        let rc = unsafe {
            libc::getpwuid_r(uid, &mut passwd, buf.as_mut_ptr(), buf.len(), &mut result)
        };
        if rc == libc::ERANGE && buf.len() < 1 << 20 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() || passwd.pw_name.is_null() {
            return None;
        }
        // SAFETY: on success pw_name points into `buf`, NUL-terminated.
        let name = unsafe { CStr::from_ptr(passwd.pw_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}
