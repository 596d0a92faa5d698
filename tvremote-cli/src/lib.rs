//! # tvremote-cli — Command-line TV remote
//!
//! Launches the protocol engine, connects to one device, walks the user
//! through pairing when the device asks for it, then reads remote-control
//! commands from stdin.

pub mod config;
pub mod repl;
