//! Scripted command runner (testing only)
//!
//! `ScriptedRunner` satisfies the [`CommandRunner`] contract without spawning
//! processes: a handler decides each command's output, and every call is
//! recorded for later assertions.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

type Handler = Box<dyn Fn(&CommandSpec) -> CommandOutput + Send + Sync>;

pub struct ScriptedRunner {
    handler: Handler,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    /// Answer each command with whatever `handler` returns.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CommandSpec) -> CommandOutput + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every command exits 0 with output `ok\n`.
    pub fn succeeding() -> Self {
        Self::new(|_| CommandOutput::success("ok\n"))
    }

    /// Every command exits 1 with output `boom\n`.
    pub fn failing() -> Self {
        Self::new(|_| CommandOutput::failure("boom\n", 1))
    }

    /// Commands received so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Command lines received so far, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::command_line).collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> CommandOutput {
        self.calls.lock().unwrap().push(spec.clone());
        (self.handler)(spec)
    }
}
