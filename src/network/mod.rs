pub mod codec;
pub mod connection;
pub mod listener;

pub use connection::{Connection, TransportSettings};
pub use listener::{serve, ListenerHandle};
