//! Running external indexers

use crate::index::types::ToolCommand;
use crate::utils::LogSink;
use std::process::{Command, Stdio};
use std::thread;

/// Runs an indexer command to completion and reports whether it succeeded
pub trait ToolRunner {
    /// `true` iff the process ran and exited with status zero
    fn run(&self, command: &ToolCommand, log: &mut LogSink) -> bool;
}

/// Spawns the tool as a child process on a dedicated thread and blocks until it exits
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand, log: &mut LogSink) -> bool {
        let program = command.program.clone();
        let args = command.args.clone();

        let worker = thread::Builder::new()
            .name("indexer".to_string())
            .spawn(move || {
                Command::new(&program)
                    .args(&args)
                    .stdin(Stdio::null())
                    .status()
            });

        let handle = match worker {
            Ok(handle) => handle,
            Err(e) => {
                log.error(format!("failed to start indexer thread: {}", e));
                return false;
            }
        };

        match handle.join() {
            Ok(Ok(status)) if status.success() => true,
            Ok(Ok(status)) => {
                log.error(format!(
                    "{} exited with {}",
                    command.program.display(),
                    status
                ));
                false
            }
            Ok(Err(e)) => {
                log.error(format!("failed to run {}: {}", command.program.display(), e));
                false
            }
            Err(_) => {
                log.error("indexer thread panicked");
                false
            }
        }
    }
}
