pub mod dijkstra;

pub use dijkstra::{calculate_shortest_path, ShortestPath};
