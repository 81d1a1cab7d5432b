use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::SIGCHLD;
use tracing::{debug, warn};

use crate::job_control;
use crate::jobs::JobRegistry;

/// Reconciles the job table with terminated children.
///
/// The SIGCHLD handler only raises a flag; the waiting and bookkeeping run
/// on the main thread via [`Reaper::reconcile`], once per input line and
/// before the line is dispatched.
#[derive(Debug, Clone, Default)]
pub struct Reaper {
    pending: Arc<AtomicBool>,
}

impl Reaper {
    /// Register the SIGCHLD flag handler.
    pub fn install() -> io::Result<Self> {
        let reaper = Self::default();
        signal_hook::flag::register(SIGCHLD, Arc::clone(&reaper.pending))?;
        Ok(reaper)
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Collect every terminated child if a SIGCHLD arrived since the last
    /// call. Returns the number of children collected.
    pub fn reconcile(&self, jobs: &mut JobRegistry) -> usize {
        // Clear first so a child exiting mid-loop re-arms the flag.
        if !self.pending.swap(false, Ordering::SeqCst) {
            return 0;
        }
        reap_terminated(jobs)
    }
}

/// Non-blocking reap loop. Pids that belong to no tracked job (foreground
/// leftovers, untracked background stages) are collected and ignored.
fn reap_terminated(jobs: &mut JobRegistry) -> usize {
    let mut reaped = 0;
    loop {
        match job_control::reap_any() {
            Ok(Some((pid, code))) => {
                reaped += 1;
                if let Some(id) = jobs.mark_exited(pid) {
                    debug!(id, pid, code, "background job finished");
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!(%err, "waitpid failed while reaping");
                break;
            }
        }
    }
    reaped
}
