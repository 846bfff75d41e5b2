use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::RouterId;

/// Port value of the self entry carried by a bootstrap LSA.
pub const SELF_PORT: i32 = -1;

/// One advertised edge: `link_id` is the neighbor's simulated IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescription {
    pub link_id: RouterId,
    pub port: i32,
    pub weight: u32,
}

impl LinkDescription {
    pub fn new(link_id: impl Into<RouterId>, port: i32, weight: u32) -> Self {
        Self {
            link_id: link_id.into(),
            port,
            weight,
        }
    }

    pub fn self_entry(router_id: &str) -> Self {
        Self::new(router_id, SELF_PORT, 0)
    }
}

impl fmt::Display for LinkDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.link_id, self.port, self.weight)
    }
}

/// Link State Advertisement: the complete adjacency list of one router,
/// versioned by `sequence_number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lsa {
    pub link_state_id: RouterId,
    pub sequence_number: i32,
    pub links: Vec<LinkDescription>,
}

impl Lsa {
    /// The LSA a router starts with: only itself, oldest sequence number.
    pub fn init_self(router_id: &str) -> Self {
        Self {
            link_state_id: router_id.to_string(),
            sequence_number: i32::MIN,
            links: vec![LinkDescription::self_entry(router_id)],
        }
    }

    pub fn is_newer_than(&self, other: &Lsa) -> bool {
        self.sequence_number > other.sequence_number
    }

    /// Advertised neighbors, without the self entry.
    pub fn neighbors(&self) -> impl Iterator<Item = &LinkDescription> {
        self.links.iter().filter(move |l| l.link_id != self.link_state_id)
    }

    /// Moves to the next sequence number. At `i32::MAX` the number stays put
    /// and neighbors holding the current copy will ignore further changes.
    pub(crate) fn bump(&mut self) {
        if self.sequence_number == i32::MAX {
            warn!(
                "Sequence number of {}'s LSA is exhausted, changes will not be accepted by neighbors",
                self.link_state_id
            );
            return;
        }
        self.sequence_number += 1;
    }
}

impl fmt::Display for Lsa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}):", self.link_state_id, self.sequence_number)?;
        for link in &self.links {
            write!(f, "\t{}", link)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_lsa_only_lists_itself() {
        let lsa = Lsa::init_self("192.168.1.1");
        assert_eq!(lsa.sequence_number, i32::MIN);
        assert_eq!(lsa.links, vec![LinkDescription::new("192.168.1.1", SELF_PORT, 0)]);
        assert_eq!(lsa.neighbors().count(), 0);
    }

    #[test]
    fn bump_stops_at_the_last_sequence_number() {
        let mut lsa = Lsa::init_self("1.1.1.1");
        lsa.bump();
        assert_eq!(lsa.sequence_number, i32::MIN + 1);

        lsa.sequence_number = i32::MAX - 1;
        lsa.bump();
        assert_eq!(lsa.sequence_number, i32::MAX);
        lsa.bump();
        assert_eq!(lsa.sequence_number, i32::MAX);
    }

    #[test]
    fn display_matches_lsd_dump_format() {
        let mut lsa = Lsa::init_self("1.1.1.1");
        lsa.links.push(LinkDescription::new("2.2.2.2", 0, 4));
        assert_eq!(lsa.to_string(), format!("1.1.1.1({}):\t1.1.1.1,-1,0\t2.2.2.2,0,4", i32::MIN));
    }
}
