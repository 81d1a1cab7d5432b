use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tracing::debug;

const NONE: u8 = 0;
const AT_PROMPT: u8 = 1;
const DURING_CHILD: u8 = 2;

/// Where the shell was when the last Ctrl-C arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOrigin {
    /// The shell itself was waiting for input.
    Prompt,
    /// A foreground child was running; it received the signal too.
    ForegroundChild,
}

#[derive(Debug, Default)]
struct Flags {
    pending: AtomicU8,
    child_active: AtomicBool,
}

/// Cooperative SIGINT state shared between the handler thread and the read
/// loop. Interrupts never terminate the shell.
#[derive(Debug, Clone, Default)]
pub struct InterruptController {
    flags: Arc<Flags>,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route SIGINT to this controller for the rest of the process.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let controller = self.clone();
        ctrlc::set_handler(move || controller.on_interrupt(&mut io::stdout()))
    }

    /// Handler body: record the interrupt, and echo a newline only when no
    /// foreground child owns the terminal output.
    pub(crate) fn on_interrupt(&self, out: &mut dyn Write) {
        let origin = if self.flags.child_active.load(Ordering::SeqCst) {
            DURING_CHILD
        } else {
            let _ = out.write_all(b"\n");
            let _ = out.flush();
            AT_PROMPT
        };
        self.flags.pending.store(origin, Ordering::SeqCst);
    }

    /// Consume the pending interrupt, if any.
    pub fn take(&self) -> Option<InterruptOrigin> {
        let origin = match self.flags.pending.swap(NONE, Ordering::SeqCst) {
            AT_PROMPT => InterruptOrigin::Prompt,
            DURING_CHILD => InterruptOrigin::ForegroundChild,
            _ => return None,
        };
        debug!(?origin, "interrupt consumed");
        Some(origin)
    }

    #[cfg(test)]
    pub fn child_active(&self) -> bool {
        self.flags.child_active.load(Ordering::SeqCst)
    }

    /// Mark a foreground wait in progress until the guard is dropped.
    pub fn foreground(&self) -> ForegroundGuard<'_> {
        self.flags.child_active.store(true, Ordering::SeqCst);
        ForegroundGuard { controller: self }
    }
}

/// RAII guard: the child-active flag is cleared on drop, including on an
/// early return from the wait.
pub struct ForegroundGuard<'a> {
    controller: &'a InterruptController,
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        self.controller
            .flags
            .child_active
            .store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_pending_initially() {
        let controller = InterruptController::new();
        assert_eq!(controller.take(), None);
        assert!(!controller.child_active());
    }

    #[test]
    fn interrupt_at_prompt_echoes_newline() {
        let controller = InterruptController::new();
        let mut out = Vec::new();
        controller.on_interrupt(&mut out);
        assert_eq!(out, b"\n");
        assert_eq!(controller.take(), Some(InterruptOrigin::Prompt));
        assert_eq!(controller.take(), None);
    }

    #[test]
    fn interrupt_during_child_is_silent() {
        let controller = InterruptController::new();
        let mut out = Vec::new();
        {
            let _guard = controller.foreground();
            assert!(controller.child_active());
            controller.on_interrupt(&mut out);
        }
        assert!(out.is_empty());
        assert!(!controller.child_active());
        assert_eq!(controller.take(), Some(InterruptOrigin::ForegroundChild));
    }

    #[test]
    fn clones_share_state() {
        let controller = InterruptController::new();
        let handler_side = controller.clone();
        handler_side.on_interrupt(&mut Vec::new());
        assert_eq!(controller.take(), Some(InterruptOrigin::Prompt));
    }
}
