use crate::{RouterId, PORT_COUNT};
use crate::error::{Result, RouterError};
use super::neighbor::Link;

#[derive(Debug, Clone, Default)]
enum Slot {
    #[default]
    Free,
    /// Held by a handshake in flight towards the named router.
    Reserved(RouterId),
    Occupied(Link),
}

/// Fixed-size table of this router's links, indexed by port.
///
/// Scanning for a free slot and claiming it happen in the same `&mut self`
/// call, so holding the table's lock across `reserve` is enough to keep two
/// handshakes from landing on the same port.
#[derive(Debug, Clone, Default)]
pub struct PortTable {
    slots: [Slot; PORT_COUNT],
}

impl PortTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the lowest free port for a handshake with `peer`.
    pub fn reserve(&mut self, peer: &str) -> Result<usize> {
        if self.is_known(peer) {
            return Err(RouterError::AlreadyAttached(peer.to_string()));
        }

        let port = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Slot::Free))
            .ok_or(RouterError::PortsExhausted)?;
        self.slots[port] = Slot::Reserved(peer.to_string());
        Ok(port)
    }

    /// Like `reserve`, but takes over the slot of a handshake already in
    /// flight towards `peer`.
    pub fn claim(&mut self, peer: &str) -> Result<usize> {
        match self.reserved_for(peer) {
            Some(port) => Ok(port),
            None => self.reserve(peer),
        }
    }

    /// Port held by a pending reservation for `peer`, if any.
    pub fn reserved_for(&self, peer: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Slot::Reserved(p) if p == peer))
    }

    /// Turns a reservation into a link. The link's `port` picks the slot.
    pub fn commit(&mut self, link: Link) {
        let port = link.port;
        debug_assert!(
            matches!(&self.slots[port], Slot::Reserved(peer) if *peer == link.neighbor.router_id),
            "committing port {} without a matching reservation",
            port
        );
        self.slots[port] = Slot::Occupied(link);
    }

    /// Gives back a reservation that did not turn into a link.
    pub fn cancel(&mut self, port: usize) {
        if let Some(slot) = self.slots.get_mut(port) {
            if matches!(slot, Slot::Reserved(_)) {
                *slot = Slot::Free;
            }
        }
    }

    pub fn get(&self, port: usize) -> Result<&Link> {
        match self.slots.get(port) {
            None => Err(RouterError::InvalidPort(port)),
            Some(Slot::Occupied(link)) => Ok(link),
            Some(_) => Err(RouterError::PortEmpty(port)),
        }
    }

    pub fn get_mut(&mut self, port: usize) -> Result<&mut Link> {
        match self.slots.get_mut(port) {
            None => Err(RouterError::InvalidPort(port)),
            Some(Slot::Occupied(link)) => Ok(link),
            Some(_) => Err(RouterError::PortEmpty(port)),
        }
    }

    pub fn remove(&mut self, port: usize) -> Result<Link> {
        self.get(port)?;
        match std::mem::take(&mut self.slots[port]) {
            Slot::Occupied(link) => Ok(link),
            _ => Err(RouterError::PortEmpty(port)),
        }
    }

    pub fn find(&self, router_id: &str) -> Option<&Link> {
        self.links().find(|link| link.neighbor.router_id == router_id)
    }

    pub fn find_mut(&mut self, router_id: &str) -> Option<&mut Link> {
        self.slots.iter_mut().find_map(|slot| match slot {
            Slot::Occupied(link) if link.neighbor.router_id == router_id => Some(link),
            _ => None,
        })
    }

    /// Whether `router_id` holds a link or a pending reservation.
    pub fn is_known(&self, router_id: &str) -> bool {
        self.slots.iter().any(|slot| match slot {
            Slot::Free => false,
            Slot::Reserved(peer) => peer == router_id,
            Slot::Occupied(link) => link.neighbor.router_id == router_id,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(link) => Some(link),
            _ => None,
        })
    }

    pub fn two_way_links(&self) -> impl Iterator<Item = &Link> {
        self.links().filter(|link| link.neighbor.is_two_way())
    }

    pub fn free_count(&self) -> usize {
        self.slots.iter().filter(|slot| matches!(slot, Slot::Free)).count()
    }
}
