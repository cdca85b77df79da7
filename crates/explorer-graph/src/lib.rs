//! explorer-graph crate
//!
//! Contract reference discovery: the address-reference heuristic, contract
//! resolution from explorer metadata, depth-first traversal into a
//! [`graph::ContractGraph`], and DOT/JSON/table rendering.

pub mod graph;
pub mod heuristic;
pub mod render;
pub mod resolver;
pub mod traversal;

pub use graph::{ContractGraph, Edge};
pub use heuristic::is_reference_candidate;
pub use resolver::{ContractResolver, Resolution};
pub use traversal::{TraversalBudget, TraversalEngine, TraversalStats};
