pub mod algorithms;
pub mod config;
pub mod console;
pub mod error;
pub mod network;
pub mod protocol;

/// Simulated IP of a router. Used as the LSDB key and as the protocol-level
/// address, independent of where the process actually listens.
pub type RouterId = String;

/// Number of link slots every router owns.
pub const PORT_COUNT: usize = 4;

pub use config::RouterConfig;
pub use error::{NoPath, RouterError};
pub use protocol::{ApprovalQueue, Delivery, Notice, Router};
