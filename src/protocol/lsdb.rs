use std::collections::HashMap;
use std::fmt;
use crate::RouterId;
use crate::algorithms::{calculate_shortest_path, ShortestPath};
use crate::error::NoPath;
use super::lsa::{LinkDescription, Lsa};

/// Every LSA this router knows about, keyed by advertising router.
///
/// The owner's own entry is always present and is the only one mutated
/// locally; all other entries are installed verbatim from LSA updates.
#[derive(Debug, Clone)]
pub struct LinkStateDatabase {
    owner: RouterId,
    store: HashMap<RouterId, Lsa>,
}

impl LinkStateDatabase {
    pub fn new(owner: impl Into<RouterId>) -> Self {
        let owner = owner.into();
        let mut store = HashMap::new();
        store.insert(owner.clone(), Lsa::init_self(&owner));
        Self { owner, store }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn own_lsa(&self) -> &Lsa {
        &self.store[&self.owner]
    }

    fn own_lsa_mut(&mut self) -> &mut Lsa {
        self.store
            .entry(self.owner.clone())
            .or_insert_with_key(|owner| Lsa::init_self(owner))
    }

    pub fn get(&self, router_id: &str) -> Option<&Lsa> {
        self.store.get(router_id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Snapshot of every LSA, ordered by router id.
    pub fn lsas(&self) -> Vec<Lsa> {
        let mut lsas: Vec<Lsa> = self.store.values().cloned().collect();
        lsas.sort_by(|a, b| a.link_state_id.cmp(&b.link_state_id));
        lsas
    }

    pub fn shortest_path(&self, destination: &str) -> Result<ShortestPath, NoPath> {
        calculate_shortest_path(&self.store, &self.owner, destination)
    }

    /// Upserts an edge of the own LSA, keyed by neighbor id. Returns whether
    /// anything changed; the sequence number only moves when it did.
    pub fn update_link(&mut self, link: LinkDescription) -> bool {
        let lsa = self.own_lsa_mut();

        match lsa.links.iter_mut().find(|l| l.link_id == link.link_id) {
            Some(existing) if *existing == link => return false,
            Some(existing) => {
                existing.port = link.port;
                existing.weight = link.weight;
            }
            None => lsa.links.push(link),
        }

        lsa.bump();
        true
    }

    /// Drops the edge towards `neighbor` from the own LSA.
    pub fn remove_link(&mut self, neighbor: &str) -> bool {
        if neighbor == self.owner {
            return false;
        }

        let lsa = self.own_lsa_mut();
        let before = lsa.links.len();
        lsa.links.retain(|l| l.link_id != neighbor);
        if lsa.links.len() == before {
            return false;
        }

        lsa.bump();
        true
    }

    /// Installs an LSA received from the network if it is strictly newer than
    /// the stored copy. LSAs claiming to be ours are never installed.
    pub fn install(&mut self, lsa: Lsa) -> bool {
        if lsa.link_state_id == self.owner {
            return false;
        }

        let fresher = self
            .store
            .get(&lsa.link_state_id)
            .map_or(true, |current| lsa.is_newer_than(current));
        if !fresher {
            return false;
        }

        self.store.insert(lsa.link_state_id.clone(), lsa);
        true
    }

    /// Routers directly adjacent according to the own LSA.
    pub fn neighbors(&self) -> Vec<RouterId> {
        self.own_lsa().neighbors().map(|l| l.link_id.clone()).collect()
    }
}

impl fmt::Display for LinkStateDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lsa in self.lsas() {
            writeln!(f, "{}", lsa)?;
        }
        Ok(())
    }
}
