//! Interactive command lines.
//!
//! ```text
//! key volume_up        send one key (KEYCODE_ prefix optional)
//! home                 bare key names work too
//! text breaking bad    type text into the focused field
//! link <url>           open a deep link
//! app YouTube          launch an app by name
//! help | quit
//! ```

use thiserror::Error;
use tvremote_core::{Key, RemoteResult, TvRemote, UnknownKey};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Key(Key),
    Text(String),
    Link(String),
    App(String),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error(transparent)]
    UnknownKey(#[from] UnknownKey),
}

pub const HELP: &str = "\
commands:
  key <name>     send a key, e.g. `key volume_up` (or just `volume_up`)
  text <text>    type text
  link <url>     open a deep link
  app <name>     launch an app
  help           show this list
  quit           disconnect and exit";

/// Parse one line; blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Action>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let argument = |name: &'static str| {
        if rest.is_empty() {
            Err(ParseError::MissingArgument(name))
        } else {
            Ok(rest.to_string())
        }
    };

    let action = match verb.to_ascii_lowercase().as_str() {
        "key" => Action::Key(argument("key")?.parse()?),
        "text" => Action::Text(argument("text")?),
        "link" => Action::Link(argument("link")?),
        "app" => Action::App(argument("app")?),
        "help" | "?" => Action::Help,
        "quit" | "exit" => Action::Quit,
        _ => Action::Key(line.parse()?),
    };
    Ok(Some(action))
}

impl Action {
    /// Send this action; `Help` and `Quit` are handled by the caller.
    pub async fn run(&self, remote: &TvRemote) -> Option<RemoteResult<String>> {
        let result = match self {
            Action::Key(key) => remote.send_key(*key).await,
            Action::Text(text) => remote.send_text(text).await,
            Action::Link(link) => remote.send_app_link(link).await,
            Action::App(name) => remote.open_app_by_name(name).await,
            Action::Help | Action::Quit => return None,
        };
        Some(result)
    }
}
