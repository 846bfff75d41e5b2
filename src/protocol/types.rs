use std::fmt;
use crate::RouterId;
use crate::error::NoPath;
use super::neighbor::NeighborState;

/// Operator-facing events. The router never prints; the console (or a test)
/// subscribes and renders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Sending { destination: RouterId },
    Received { source: RouterId, payload: String },
    Forwarding { source: RouterId, destination: RouterId },
    NoPath { destination: RouterId },
    Attached { neighbor: RouterId, port: usize },
    StateChanged { neighbor: RouterId, state: NeighborState },
    Disconnected { neighbor: RouterId, port: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Sending { destination } => write!(f, "Sending message to {}", destination),
            Notice::Received { source, payload } => {
                write!(f, "Received message from {}:\n{}", source, payload)
            }
            Notice::Forwarding { source, destination } => {
                write!(f, "Forwarding packet from {} to {}", source, destination)
            }
            Notice::NoPath { .. } => write!(f, "No path found"),
            Notice::Attached { neighbor, port } => {
                write!(f, "successfully attached to {} on port {}", neighbor, port)
            }
            Notice::StateChanged { neighbor, state } => {
                write!(f, "set {} state to {}", neighbor, state)
            }
            Notice::Disconnected { neighbor, port } => {
                write!(f, "disconnected from {} on port {}", neighbor, port)
            }
        }
    }
}

/// What `send` did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Addressed to this router; delivered without touching the network.
    Local,
    Sent { next_hop: RouterId },
    NoPath(NoPath),
}
