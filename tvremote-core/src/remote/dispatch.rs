//! Remote-control commands for a connected session.

use tracing::info;

use crate::engine::EngineCommand;
use crate::error::{RemoteError, RemoteResult, classify};
use crate::remote::session::SessionManager;

/// Sends keys, text, deep links and app launches.
///
/// Every command is refused with [`RemoteError::NotConnected`] unless the
/// session is `Connected`; a refused command never reaches the engine.
/// Successful commands echo their argument back.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    sessions: SessionManager,
}

impl CommandDispatcher {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }

    /// Send a key code such as `KEYCODE_HOME`.
    pub fn send_key(&self, key_code: &str) -> RemoteResult<String> {
        self.dispatch(
            EngineCommand::SendKey {
                key: key_code.to_string(),
            },
            key_code,
        )
    }

    pub fn send_text(&self, text: &str) -> RemoteResult<String> {
        self.dispatch(
            EngineCommand::SendText {
                text: text.to_string(),
            },
            text,
        )
    }

    pub fn send_app_link(&self, link: &str) -> RemoteResult<String> {
        self.dispatch(
            EngineCommand::SendAppLink {
                link: link.to_string(),
            },
            link,
        )
    }

    pub fn open_app(&self, name: &str) -> RemoteResult<String> {
        self.dispatch(
            EngineCommand::OpenApp {
                name: name.to_string(),
            },
            name,
        )
    }

    fn dispatch(&self, command: EngineCommand, argument: &str) -> RemoteResult<String> {
        if !self.sessions.session().is_connected() {
            return Err(RemoteError::NotConnected);
        }
        let name = command.name();
        match self.sessions.adapter().execute(command) {
            Ok(_) => {
                info!("{name} delivered");
                Ok(argument.to_string())
            }
            Err(fault) => Err(self.sessions.fail(classify(fault))),
        }
    }
}
