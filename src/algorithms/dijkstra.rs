use std::collections::{BinaryHeap, HashMap};
use std::cmp::Ordering;
use std::fmt;
use crate::RouterId;
use crate::error::NoPath;
use crate::protocol::lsa::Lsa;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPath {
    pub cost: u64,
    pub path: Vec<RouterId>,
}

impl ShortestPath {
    /// Second router on the path, `None` when the path is just the source.
    pub fn next_hop(&self) -> Option<&RouterId> {
        self.path.get(1)
    }
}

impl fmt::Display for ShortestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join(" -> "))
    }
}

#[derive(Debug, PartialEq, Eq)]
struct State<'a> {
    cost: u64,
    router: &'a str,
}

impl Ord for State<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap; equal costs pop in id order
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.router.cmp(self.router))
    }
}

impl PartialOrd for State<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra over the edges advertised in `lsas`. A node's outgoing edges are
/// exactly the links of its own LSA; a node referenced by someone else but
/// without an LSA of its own is a dead end.
///
/// Ties are broken deterministically: among equal-cost frontier entries the
/// lexicographically smaller router is settled first, and a parent is only
/// replaced by a strictly shorter distance.
pub fn calculate_shortest_path(
    lsas: &HashMap<RouterId, Lsa>,
    source: &str,
    destination: &str,
) -> Result<ShortestPath, NoPath> {
    if !lsas.contains_key(destination) {
        return Err(NoPath::UnknownDestination);
    }
    if source == destination {
        return Ok(ShortestPath {
            cost: 0,
            path: vec![source.to_string()],
        });
    }

    let mut distances: HashMap<&str, u64> = HashMap::new();
    let mut previous: HashMap<&str, &str> = HashMap::new();
    let mut heap = BinaryHeap::new();

    distances.insert(source, 0);
    heap.push(State { cost: 0, router: source });

    while let Some(State { cost, router }) = heap.pop() {
        // Skip if we've already found a better path
        if cost > distance_to(&distances, router) {
            continue;
        }
        if router == destination {
            break;
        }

        let Some(lsa) = lsas.get(router) else {
            continue;
        };

        for link in &lsa.links {
            let neighbor = link.link_id.as_str();
            if neighbor == router {
                continue;
            }

            let new_cost = cost.saturating_add(u64::from(link.weight));
            if new_cost < distance_to(&distances, neighbor) {
                distances.insert(neighbor, new_cost);
                previous.insert(neighbor, router);
                heap.push(State {
                    cost: new_cost,
                    router: neighbor,
                });
            }
        }
    }

    let Some(&cost) = distances.get(destination) else {
        return Err(NoPath::Unreachable);
    };

    Ok(ShortestPath {
        cost,
        path: reconstruct_path(&previous, destination),
    })
}

fn distance_to(distances: &HashMap<&str, u64>, router: &str) -> u64 {
    distances.get(router).copied().unwrap_or(u64::MAX)
}

fn reconstruct_path(previous: &HashMap<&str, &str>, dest: &str) -> Vec<RouterId> {
    let mut path = Vec::new();
    let mut current = Some(dest);

    while let Some(router) = current {
        path.push(router.to_string());
        current = previous.get(router).copied();
    }

    path.reverse();
    path
}
