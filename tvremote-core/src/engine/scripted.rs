//! In-memory engine that replays canned outcomes.
//!
//! Clones share state, so a test can hand one clone to the remote and keep
//! another to script replies and inspect the commands that were issued.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;

use crate::engine::{EngineCommand, ProtocolEngine};
use crate::error::EngineFault;

/// What a scripted command returns.
pub type ScriptedOutcome = Result<Value, EngineFault>;

#[derive(Debug, Default)]
struct Script {
    started: bool,
    start_count: usize,
    start_failure: Option<EngineFault>,
    replies: HashMap<&'static str, VecDeque<ScriptedOutcome>>,
    latency: HashMap<&'static str, Duration>,
    calls: Vec<EngineCommand>,
    released: usize,
}

/// A [`ProtocolEngine`] driven by a script.
///
/// Commands without a queued reply return `Ok(true)`. A scripted
/// [`EngineFault::Io`] also stops the engine, as a broken pipe would.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    script: Arc<Mutex<Script>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue the next outcome for `command` (an engine command name).
    pub fn push(&self, command: &'static str, outcome: ScriptedOutcome) -> &Self {
        self.script()
            .replies
            .entry(command)
            .or_default()
            .push_back(outcome);
        self
    }

    /// Make every `command` block for `latency` before replying.
    pub fn delay(&self, command: &'static str, latency: Duration) -> &Self {
        self.script().latency.insert(command, latency);
        self
    }

    /// Make the next `start` fail.
    pub fn fail_start(&self, fault: EngineFault) -> &Self {
        self.script().start_failure = Some(fault);
        self
    }

    /// Every command executed so far, in order.
    pub fn calls(&self) -> Vec<EngineCommand> {
        self.script().calls.clone()
    }

    /// Names of the commands executed so far.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.script().calls.iter().map(EngineCommand::name).collect()
    }

    pub fn start_count(&self) -> usize {
        self.script().start_count
    }

    pub fn release_count(&self) -> usize {
        self.script().released
    }
}

impl ProtocolEngine for ScriptedEngine {
    fn start(&mut self) -> Result<(), EngineFault> {
        let mut script = self.script();
        if let Some(fault) = script.start_failure.take() {
            return Err(fault);
        }
        script.start_count += 1;
        script.started = true;
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.script().started
    }

    fn execute(&mut self, command: &EngineCommand) -> Result<Value, EngineFault> {
        let (latency, outcome) = {
            let mut script = self.script();
            script.calls.push(command.clone());
            let name = command.name();
            let outcome = script
                .replies
                .get_mut(name)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(Value::Bool(true)));
            if matches!(outcome, Err(EngineFault::Io(_))) {
                script.started = false;
            }
            (script.latency.get(name).copied(), outcome)
        };
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }
        outcome
    }

    fn release(&mut self) {
        self.script().released += 1;
    }
}
