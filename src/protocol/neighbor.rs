use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::RouterId;
use super::lsa::LinkDescription;
use super::messages::ProcessAddress;

/// Adjacency status. A neighbor without a link is implicitly down.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NeighborState {
    Init,
    TwoWay,
}

impl fmt::Display for NeighborState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeighborState::Init => write!(f, "INIT"),
            NeighborState::TwoWay => write!(f, "TWO_WAY"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    pub router_id: RouterId,
    pub process_addr: ProcessAddress,
    pub state: NeighborState,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_hello: DateTime<Utc>,
}

impl Neighbor {
    pub fn new(router_id: RouterId, process_addr: ProcessAddress) -> Self {
        Self {
            router_id,
            process_addr,
            state: NeighborState::Init,
            last_hello: Utc::now(),
        }
    }

    pub fn is_two_way(&self) -> bool {
        self.state == NeighborState::TwoWay
    }

    /// Moves INIT to TWO_WAY. Returns false if it already was.
    pub fn promote(&mut self) -> bool {
        self.last_hello = Utc::now();
        if self.is_two_way() {
            return false;
        }
        self.state = NeighborState::TwoWay;
        true
    }

    pub fn time_since_last_hello(&self) -> Duration {
        Utc::now().signed_duration_since(self.last_hello)
    }
}

/// An occupied port: the local end of an adjacency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub port: usize,
    pub owner: RouterId,
    pub neighbor: Neighbor,
    pub weight: u32,
}

impl Link {
    pub fn describe(&self) -> LinkDescription {
        LinkDescription::new(self.neighbor.router_id.clone(), self.port as i32, self.weight)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seen = self.neighbor.time_since_last_hello().num_seconds();
        write!(
            f,
            "{:<6} {:<16} {:<22} {:<8} {:<8} {}s ago",
            self.port,
            self.neighbor.router_id,
            self.neighbor.process_addr.to_string(),
            self.neighbor.state.to_string(),
            self.weight,
            seen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promote_only_reports_the_first_transition() {
        let mut neighbor = Neighbor::new("10.0.0.2".to_string(), ProcessAddress::new("127.0.0.1", 5000));
        assert_eq!(neighbor.state, NeighborState::Init);
        assert!(neighbor.promote());
        assert!(neighbor.is_two_way());
        assert!(!neighbor.promote());
    }

    #[test]
    fn link_description_uses_port_and_weight() {
        let link = Link {
            port: 2,
            owner: "10.0.0.1".to_string(),
            neighbor: Neighbor::new("10.0.0.2".to_string(), ProcessAddress::new("127.0.0.1", 5000)),
            weight: 9,
        };
        assert_eq!(link.describe(), LinkDescription::new("10.0.0.2", 2, 9));
    }
}
