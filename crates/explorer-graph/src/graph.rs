//! Contract reference graph.
//!
//! Nodes are resolved contracts keyed by address; edges are
//! `(source, function, target)` triples recorded in discovery order. An edge
//! target does not have to be a node: calls that return an address without
//! published metadata still produce an edge.

use std::collections::{HashMap, HashSet};

use alloy::primitives::Address;
use explorer_data::types::ContractDescriptor;
use eyre::{eyre, Result};
use petgraph::graph::{DiGraph, NodeIndex};

/// Directed reference: calling `function` on `source` returned `target`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: Address,
    pub function: String,
    pub target: Address,
}

/// Node weight of the layout graph produced by [`ContractGraph::to_digraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRef<'a> {
    /// A resolved contract.
    Contract(&'a ContractDescriptor),
    /// An edge target that never resolved.
    Unresolved(Address),
}

impl NodeRef<'_> {
    pub fn address(&self) -> Address {
        match self {
            Self::Contract(contract) => contract.address,
            Self::Unresolved(address) => *address,
        }
    }
}

/// Accumulated contracts and references from one or more traversals.
#[derive(Clone, Debug, Default)]
pub struct ContractGraph {
    nodes: HashMap<Address, ContractDescriptor>,
    /// Node insertion order.
    order: Vec<Address>,
    edges: Vec<Edge>,
}

impl ContractGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.nodes.contains_key(address)
    }

    pub fn node(&self, address: &Address) -> Option<&ContractDescriptor> {
        self.nodes.get(address)
    }

    /// Contracts in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ContractDescriptor> {
        self.order.iter().filter_map(|address| self.nodes.get(address))
    }

    /// Edges in discovery order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges leaving `address`, in discovery order.
    pub fn outgoing<'a>(&'a self, address: &'a Address) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == *address)
    }

    /// Number of contract nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts a contract. Returns `false` and keeps the existing node if the
    /// address is already present.
    pub fn insert(&mut self, contract: ContractDescriptor) -> bool {
        if self.nodes.contains_key(&contract.address) {
            return false;
        }
        self.order.push(contract.address);
        self.nodes.insert(contract.address, contract);
        true
    }

    /// Records a reference edge.
    ///
    /// # Errors
    /// Returns error if `source` is not a node of the graph.
    pub fn add_edge(
        &mut self,
        source: Address,
        function: impl Into<String>,
        target: Address,
    ) -> Result<()> {
        if !self.nodes.contains_key(&source) {
            return Err(eyre!("edge source {source} is not a node of the graph"));
        }
        self.edges.push(Edge {
            source,
            function: function.into(),
            target,
        });
        Ok(())
    }

    /// Edge targets that are not nodes, deduplicated, in first-seen order.
    pub fn dangling_targets(&self) -> Vec<Address> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .map(|edge| edge.target)
            .filter(|target| !self.nodes.contains_key(target) && seen.insert(*target))
            .collect()
    }

    /// Builds a petgraph view for layout and rendering.
    ///
    /// Contracts come first in insertion order, then dangling targets; edges
    /// are added in discovery order and weighted by function name.
    pub fn to_digraph(&self) -> DiGraph<NodeRef<'_>, &str> {
        let mut graph = DiGraph::new();
        let mut index: HashMap<Address, NodeIndex> = HashMap::new();

        for contract in self.nodes() {
            let ix = graph.add_node(NodeRef::Contract(contract));
            index.insert(contract.address, ix);
        }
        for target in self.dangling_targets() {
            let ix = graph.add_node(NodeRef::Unresolved(target));
            index.insert(target, ix);
        }
        for edge in &self.edges {
            graph.add_edge(
                index[&edge.source],
                index[&edge.target],
                edge.function.as_str(),
            );
        }

        graph
    }
}
