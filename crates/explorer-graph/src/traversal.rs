//! Depth-first contract discovery.
//!
//! Starting from a seed address, every newly resolved contract has its
//! reference candidates (see [`crate::heuristic`]) called in ABI declaration
//! order. Each returned address is recorded as an edge and explored fully
//! before the next candidate is called, which makes the edge order of a walk
//! reproducible.
//!
//! The walk uses an explicit frame stack instead of async recursion. A frame
//! holds the candidates of one contract that have not been called yet; the
//! top frame is always the contract currently being expanded.
//!
//! Termination relies on the revisit guard: an address already in the graph
//! (or already known to be a dead end) is never resolved again. An optional
//! [`TraversalBudget`] bounds node count and depth on top of that.

use std::collections::{HashSet, VecDeque};

use alloy::primitives::Address;
use explorer_data::source::{ContractCaller, MetadataSource};
use explorer_data::types::{ContractDescriptor, FunctionDescriptor};
use eyre::Result;

use crate::graph::ContractGraph;
use crate::heuristic::reference_candidates;
use crate::resolver::{ContractResolver, Resolution};

/// Limits applied to a walk. `None` means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraversalBudget {
    /// Maximum number of contracts held by the graph.
    pub max_nodes: Option<usize>,
    /// Maximum expansion depth; the seed is at depth 0.
    pub max_depth: Option<usize>,
}

impl TraversalBudget {
    pub fn unbounded() -> Self {
        Self::default()
    }

    fn allows_node(&self, node_count: usize) -> bool {
        self.max_nodes.map_or(true, |max| node_count < max)
    }

    fn allows_expansion(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }
}

/// Counters for one [`TraversalEngine::discover`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub nodes_added: usize,
    pub edges_added: usize,
    /// Addresses that resolved to `NotFound` or `Malformed`.
    pub dead_ends: usize,
    /// Candidate calls that failed and produced no edge.
    pub failed_calls: usize,
    /// Whether the budget stopped part of the walk.
    pub truncated: bool,
}

/// Called once for every contract added to the graph.
pub type Observer = Box<dyn FnMut(&ContractDescriptor) + Send>;

struct Frame {
    address: Address,
    depth: usize,
    pending: VecDeque<FunctionDescriptor>,
}

/// Builds a [`ContractGraph`] from a resolver and a contract caller.
pub struct TraversalEngine<M, C> {
    resolver: ContractResolver<M>,
    caller: C,
    budget: TraversalBudget,
    /// Addresses that resolved to nothing; never asked again.
    dead_ends: HashSet<Address>,
    observer: Option<Observer>,
}

impl<M: MetadataSource, C: ContractCaller> TraversalEngine<M, C> {
    pub fn new(resolver: ContractResolver<M>, caller: C) -> Self {
        Self {
            resolver,
            caller,
            budget: TraversalBudget::unbounded(),
            dead_ends: HashSet::new(),
            observer: None,
        }
    }

    pub fn with_budget(mut self, budget: TraversalBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_observer(
        mut self,
        observer: impl FnMut(&ContractDescriptor) + Send + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn budget(&self) -> TraversalBudget {
        self.budget
    }

    /// Adds `address` and, when `recursive`, every contract reachable through
    /// reference candidates.
    ///
    /// Addresses already in `graph` are left untouched. Resolution failures
    /// and failed candidate calls are local: they are counted in the returned
    /// stats and the walk continues.
    ///
    /// # Errors
    /// Only fails if the graph rejects an edge, which cannot happen for
    /// sources this engine inserted.
    #[tracing::instrument(skip_all, fields(seed = %address, recursive = recursive))]
    pub async fn discover(
        &mut self,
        graph: &mut ContractGraph,
        address: Address,
        recursive: bool,
    ) -> Result<TraversalStats> {
        let mut stats = TraversalStats::default();

        if !self.visit(graph, address, &mut stats).await {
            return Ok(stats);
        }
        if !recursive {
            return Ok(stats);
        }

        let mut stack = vec![self.frame(graph, address, 0, &mut stats)];

        while let Some(frame) = stack.last_mut() {
            let Some(function) = frame.pending.pop_front() else {
                stack.pop();
                continue;
            };
            let parent = frame.address;
            let depth = frame.depth;

            let child = match self.caller.call_address(parent, &function).await {
                Ok(child) => child,
                Err(err) => {
                    tracing::warn!(
                        contract = %parent,
                        function = %function.name,
                        "reference call failed: {:#}",
                        err
                    );
                    stats.failed_calls += 1;
                    continue;
                }
            };

            graph.add_edge(parent, function.name.as_str(), child)?;
            stats.edges_added += 1;
            tracing::debug!(from = %parent, function = %function.name, to = %child, "edge recorded");

            if self.visit(graph, child, &mut stats).await {
                let frame = self.frame(graph, child, depth + 1, &mut stats);
                stack.push(frame);
            }
        }

        tracing::info!(
            nodes_added = stats.nodes_added,
            edges_added = stats.edges_added,
            dead_ends = stats.dead_ends,
            failed_calls = stats.failed_calls,
            truncated = stats.truncated,
            "discovery finished"
        );

        Ok(stats)
    }

    /// Resolves and inserts `address`. Returns `true` only for a new node.
    async fn visit(
        &mut self,
        graph: &mut ContractGraph,
        address: Address,
        stats: &mut TraversalStats,
    ) -> bool {
        if graph.contains(&address) || self.dead_ends.contains(&address) {
            return false;
        }
        if !self.budget.allows_node(graph.len()) {
            tracing::debug!(%address, "node budget exhausted, not resolving");
            stats.truncated = true;
            return false;
        }

        match self.resolver.resolve(address).await {
            Resolution::Found(contract) => {
                tracing::info!(
                    address = %contract.address,
                    name = %contract.name,
                    read = contract.read.len(),
                    write = contract.write.len(),
                    "contract resolved"
                );
                if let Some(observer) = self.observer.as_mut() {
                    observer(&contract);
                }
                graph.insert(contract);
                stats.nodes_added += 1;
                true
            }
            Resolution::NotFound => {
                tracing::debug!(%address, "no published ABI");
                self.dead_ends.insert(address);
                stats.dead_ends += 1;
                false
            }
            Resolution::Malformed(reason) => {
                tracing::debug!(%address, %reason, "malformed ABI");
                self.dead_ends.insert(address);
                stats.dead_ends += 1;
                false
            }
        }
    }

    fn frame(
        &self,
        graph: &ContractGraph,
        address: Address,
        depth: usize,
        stats: &mut TraversalStats,
    ) -> Frame {
        let candidates: VecDeque<FunctionDescriptor> = graph
            .node(&address)
            .map(|contract| reference_candidates(contract).cloned().collect())
            .unwrap_or_default();

        let pending = if self.budget.allows_expansion(depth) {
            candidates
        } else {
            if !candidates.is_empty() {
                tracing::debug!(%address, depth, "depth budget reached, not expanding");
                stats.truncated = true;
            }
            VecDeque::new()
        };

        Frame {
            address,
            depth,
            pending,
        }
    }
}
