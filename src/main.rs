mod ast;
mod builtins;
mod config;
mod error;
mod executor;
mod history;
mod interrupt;
mod job_control;
mod jobs;
mod listing;
mod logging;
mod parser;
mod prompt;
mod reaper;
mod redirect;
mod shell;

use tracing::debug;

use crate::config::ShellConfig;
use crate::interrupt::InterruptController;
use crate::reaper::Reaper;
use crate::shell::Shell;

fn main() {
    let config = ShellConfig::from_env();
    logging::init(&config);

    let interrupts = InterruptController::new();
    if let Err(err) = interrupts.install() {
        eprintln!("miniShell: failed to install SIGINT handler: {err}");
        std::process::exit(1);
    }

    let reaper = match Reaper::install() {
        Ok(reaper) => reaper,
        Err(err) => {
            eprintln!("miniShell: failed to install SIGCHLD handler: {err}");
            std::process::exit(1);
        }
    };

    let mut shell = Shell::new(&config, interrupts, reaper);
    let code = match shell.run() {
        Ok(code) => code,
        Err(err) => {
            debug!(%err, "shell terminated");
            eprintln!("miniShell: {err}");
            1
        }
    };

    std::process::exit(code);
}
