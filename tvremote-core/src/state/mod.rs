pub mod cell;
pub mod connection;
mod pairing;
mod session;

pub use cell::{StateCell, StateStream};
pub use connection::ConnectionState;
pub use pairing::PairingState;
pub use session::Session;
