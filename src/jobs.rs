use std::io::{self, Write};

use tracing::debug;

use crate::error::JobError;
use crate::job_control::{self, Pid};

/// One process belonging to a background pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageProcess {
    pub pid: Pid,
    pub running: bool,
}

/// A tracked background pipeline.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: usize,
    pub label: String,
    pub active: bool,
    processes: Vec<StageProcess>,
}

impl Job {
    /// The pid reported for the job: its last stage.
    pub fn pid(&self) -> Pid {
        self.processes.last().map_or(0, |p| p.pid)
    }

    #[cfg(test)]
    pub fn processes(&self) -> &[StageProcess] {
        &self.processes
    }

    fn find_running(&mut self, pid: Pid) -> Option<&mut StageProcess> {
        self.processes
            .iter_mut()
            .find(|p| p.running && p.pid == pid)
    }

    fn running_pids(&self) -> Vec<Pid> {
        self.processes
            .iter()
            .filter(|p| p.running)
            .map(|p| p.pid)
            .collect()
    }
}

/// The shell's job table.
///
/// Job ids are 1-based positions in registration order. Slots are never
/// compacted or reused: a finished job stays in place marked inactive, so
/// ids printed earlier keep referring to the same job.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: Vec<Job>,
    capacity: usize,
}

impl JobRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() >= self.capacity
    }

    /// Track a background pipeline. Returns `None` when the table is full;
    /// the processes keep running but are not managed.
    pub fn register(&mut self, pids: Vec<Pid>, label: &str) -> Option<usize> {
        if pids.is_empty() {
            return None;
        }
        if self.is_full() {
            debug!(label, capacity = self.capacity, "job table full; not tracking");
            return None;
        }

        let id = self.jobs.len() + 1;
        self.jobs.push(Job {
            id,
            label: label.to_string(),
            active: true,
            processes: pids
                .into_iter()
                .map(|pid| StageProcess { pid, running: true })
                .collect(),
        });
        debug!(id, label, "registered background job");
        Some(id)
    }

    /// Active jobs in registration order.
    pub fn active(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|job| job.active)
    }

    #[cfg(test)]
    pub fn get(&self, id: usize) -> Option<&Job> {
        id.checked_sub(1).and_then(|index| self.jobs.get(index))
    }

    /// Print active jobs as `[<id>] <pid> <label>`.
    pub fn write_listing(&self, out: &mut dyn Write) -> io::Result<()> {
        for job in self.active() {
            writeln!(out, "[{}] {} {}", job.id, job.pid(), job.label)?;
        }
        Ok(())
    }

    /// Record that `pid` has terminated. Returns the job id when this was
    /// the job's last running process. Unknown pids are ignored.
    ///
    /// Only running stages match: a pid already marked exited may have been
    /// reused by the kernel for a later job.
    pub fn mark_exited(&mut self, pid: Pid) -> Option<usize> {
        for job in self.jobs.iter_mut().filter(|job| job.active) {
            let Some(process) = job.find_running(pid) else {
                continue;
            };
            process.running = false;
            if job.processes.iter().all(|p| !p.running) {
                job.active = false;
                return Some(job.id);
            }
            return None;
        }
        None
    }

    /// Block until every still-running process of job `id` exits, then mark
    /// the job inactive. Returns the last stage's exit code when it was
    /// collected here.
    pub fn foreground(&mut self, id: usize) -> Result<Option<i32>, JobError> {
        let index = self.active_index(id)?;
        let job = &mut self.jobs[index];
        let last_pid = job.pid();
        let mut last_code = None;

        for pid in job.running_pids() {
            let code = job_control::wait_for_pid(pid)
                .map_err(|source| JobError::Wait { id, source })?;
            if let Some(process) = job.find_running(pid) {
                process.running = false;
            }
            if pid == last_pid {
                last_code = code;
            }
        }

        job.active = false;
        Ok(last_code)
    }

    /// Send `SIGCONT` to every still-running process of job `id`. The job's
    /// active flag is left unchanged.
    pub fn resume(&self, id: usize) -> Result<(), JobError> {
        let index = self.active_index(id)?;
        for pid in self.jobs[index].running_pids() {
            job_control::send_continue(pid).map_err(|source| JobError::Resume { id, source })?;
        }
        Ok(())
    }

    fn active_index(&self, id: usize) -> Result<usize, JobError> {
        let index = id.checked_sub(1).ok_or(JobError::NoSuchJob)?;
        match self.jobs.get(index) {
            Some(job) if job.active => Ok(index),
            _ => Err(JobError::NoSuchJob),
        }
    }
}
