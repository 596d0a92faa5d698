//! Protocol engine hosted in a child process.
//!
//! One JSON object per line in each direction:
//!
//! ```text
//! → {"command": "connect_to_tv", "args": ["192.168.1.50", "tvremote"]}
//! ← {"ok": true}
//! ← {"error": {"kind": "pairing_required", "message": "..."}}
//! ```
//!
//! Requests are strictly sequential; the engine answers each before the
//! next is written.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::engine::{EngineCommand, ProtocolEngine};
use crate::error::EngineFault;

/// Marker some engines put in the message instead of setting `kind`.
const PAIRING_REQUIRED_MARKER: &str = "PAIRING_REQUIRED";

/// Sent on release; not part of the core command set.
const DISCONNECT_COMMAND: &str = "disconnect_from_tv";

#[derive(Debug, Serialize)]
struct Request<'a> {
    command: &'a str,
    args: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Response {
    Ok(Value),
    Error(ErrorBody),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    message: String,
}

impl ErrorBody {
    fn into_fault(self) -> EngineFault {
        if self.kind == "pairing_required" || self.message.contains(PAIRING_REQUIRED_MARKER) {
            EngineFault::PairingRequired
        } else if self.message.is_empty() {
            EngineFault::Failed(format!("engine reported {}", self.kind))
        } else {
            EngineFault::Failed(self.message)
        }
    }
}

struct Pipes {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Engine running as `program args...`.
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
    pipes: Option<Pipes>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            pipes: None,
        }
    }

    fn round_trip(&mut self, command: &str, args: &[&str]) -> Result<Value, EngineFault> {
        let pipes = self.pipes.as_mut().ok_or(EngineFault::NotStarted)?;

        let mut line = serde_json::to_string(&Request { command, args })?;
        line.push('\n');
        pipes.stdin.write_all(line.as_bytes())?;
        pipes.stdin.flush()?;

        let mut reply = String::new();
        if pipes.stdout.read_line(&mut reply)? == 0 {
            return Err(EngineFault::Io("engine closed its output".into()));
        }
        match serde_json::from_str::<Response>(reply.trim())? {
            Response::Ok(value) => Ok(value),
            Response::Error(body) => Err(body.into_fault()),
        }
    }
}

impl ProtocolEngine for ProcessEngine {
    fn start(&mut self) -> Result<(), EngineFault> {
        if self.pipes.is_some() {
            return Ok(());
        }
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| EngineFault::Io(format!("failed to spawn {}: {e}", self.program)))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(EngineFault::Io("engine pipes unavailable".into()));
        };
        info!("engine process {} started (pid {})", self.program, child.id());
        self.pipes = Some(Pipes {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        });
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.pipes.is_some()
    }

    fn execute(&mut self, command: &EngineCommand) -> Result<Value, EngineFault> {
        self.request(command.name(), &command.args())
    }

    fn release(&mut self) {
        if let Err(e) = self.request(DISCONNECT_COMMAND, &[]) {
            debug!("engine disconnect ignored: {e}");
        }
    }
}

impl ProcessEngine {
    fn request(&mut self, command: &str, args: &[&str]) -> Result<Value, EngineFault> {
        let result = self.round_trip(command, args);
        if let Err(EngineFault::Io(e)) = &result {
            // the pipe is unusable after a framing or i/o error
            warn!("engine process failed: {e}");
            self.shutdown();
        }
        result
    }

    fn shutdown(&mut self) {
        if let Some(mut pipes) = self.pipes.take() {
            let _ = pipes.child.kill();
            let _ = pipes.child.wait();
        }
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
