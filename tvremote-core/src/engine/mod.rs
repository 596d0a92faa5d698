//! # Protocol engine boundary
//!
//! The wire protocol (discovery, certificate pairing, key/text/app frames)
//! lives in an external engine. The remote only submits named commands with
//! positional arguments and interprets what comes back.
//!
//! | Module     | Purpose                                            |
//! |----------- |----------------------------------------------------|
//! | `adapter`  | Guarded, idempotent start plus command execution   |
//! | `process`  | Engine running as a child process, JSON lines      |
//! | `scripted` | In-memory engine with recorded calls and canned replies |

pub mod adapter;
pub mod process;
pub mod scripted;

use serde_json::Value;

use crate::error::EngineFault;

pub use adapter::EngineAdapter;
pub use process::ProcessEngine;
pub use scripted::{ScriptedEngine, ScriptedOutcome};

// ── ProtocolEngine ───────────────────────────────────────────────

/// A synchronous protocol engine.
///
/// Every call may block on the network and may fault; callers must not
/// assume any command is idempotent except [`start`](Self::start).
pub trait ProtocolEngine: Send {
    /// Bring the engine up. A second call on a started engine is a no-op.
    fn start(&mut self) -> Result<(), EngineFault>;

    fn is_started(&self) -> bool;

    /// Run one command and return its raw result.
    fn execute(&mut self, command: &EngineCommand) -> Result<Value, EngineFault>;

    /// Best-effort release of the device link.
    fn release(&mut self) {}
}

// ── EngineCommand ────────────────────────────────────────────────

/// The commands an engine must understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    ConnectToTv { ip: String, client_name: String },
    GetDeviceInfo,
    FinishPairing { code: String },
    RetryConnection,
    SendKey { key: String },
    SendText { text: String },
    SendAppLink { link: String },
    OpenApp { name: String },
}

impl EngineCommand {
    /// Name the engine dispatches on.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectToTv { .. } => "connect_to_tv",
            Self::GetDeviceInfo => "get_device_info",
            Self::FinishPairing { .. } => "finish_pairing",
            Self::RetryConnection => "retry_connection",
            Self::SendKey { .. } => "send_key",
            Self::SendText { .. } => "send_text",
            Self::SendAppLink { .. } => "send_app_link",
            Self::OpenApp { .. } => "open_app",
        }
    }

    /// Positional arguments, in the order the engine expects them.
    pub fn args(&self) -> Vec<&str> {
        match self {
            Self::ConnectToTv { ip, client_name } => vec![ip.as_str(), client_name.as_str()],
            Self::GetDeviceInfo | Self::RetryConnection => Vec::new(),
            Self::FinishPairing { code } => vec![code.as_str()],
            Self::SendKey { key } => vec![key.as_str()],
            Self::SendText { text } => vec![text.as_str()],
            Self::SendAppLink { link } => vec![link.as_str()],
            Self::OpenApp { name } => vec![name.as_str()],
        }
    }

    /// Whether the arguments are user content that should stay out of logs.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Self::FinishPairing { .. } | Self::SendText { .. })
    }
}

impl std::fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_sensitive() {
            let len: usize = self.args().iter().map(|a| a.len()).sum();
            write!(f, "{}(<{len} bytes>)", self.name())
        } else {
            write!(f, "{}({})", self.name(), self.args().join(", "))
        }
    }
}

/// Interpret a raw engine result as success or failure.
///
/// `true`, non-zero numbers, the text `"true"`, and non-empty objects or
/// arrays are truthy; everything else is not.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
