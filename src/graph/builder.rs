use super::{DependencyGraph, ModuleNode};
use crate::store::StoreSnapshot;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

/// A raw "imports" edge produced by an [`EdgeExtractor`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportEdge {
    pub from: String,
    pub to: String,
    /// Specifier text when the edge comes from a bare `export * from '...'`
    pub whole_reexport: Option<String>,
}

impl ImportEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            whole_reexport: None,
        }
    }

    pub fn whole_reexport(
        from: impl Into<String>,
        to: impl Into<String>,
        specifier: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            whole_reexport: Some(specifier.into()),
        }
    }
}

/// Source of import edges for graph construction
pub trait EdgeExtractor {
    fn extract(&self, store: &StoreSnapshot, entrypoints: &[String]) -> Vec<ImportEdge>;
}

/// Incremental builder for [`DependencyGraph`]
pub struct GraphBuilder {
    inner: StableDiGraph<ModuleNode, ()>,
    node_map: HashMap<String, NodeIndex>,
    pending_edges: Vec<ImportEdge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            inner: StableDiGraph::new(),
            node_map: HashMap::new(),
            pending_edges: Vec::new(),
        }
    }

    /// Add a module vertex. Adding the same path twice is a no-op
    pub fn add_module(&mut self, path: impl Into<String>) -> &mut Self {
        let path = path.into();
        if !self.node_map.contains_key(&path) {
            let idx = self.inner.add_node(ModuleNode::new(path.clone()));
            self.node_map.insert(path, idx);
        }
        self
    }

    /// Queue an edge; edges are resolved against modules when building
    pub fn add_edge(&mut self, edge: ImportEdge) -> &mut Self {
        self.pending_edges.push(edge);
        self
    }

    /// Finish the graph and compute depths from `entrypoints`
    pub fn build(mut self, entrypoints: &[String]) -> DependencyGraph {
        let edges = std::mem::take(&mut self.pending_edges);
        let mut dropped = 0usize;

        for edge in edges {
            let (Some(&from), Some(&to)) = (self.node_map.get(&edge.from), self.node_map.get(&edge.to))
            else {
                trace!("Dropping edge {} -> {}: endpoint not in graph", edge.from, edge.to);
                dropped += 1;
                continue;
            };

            self.inner.update_edge(from, to, ());

            if let Some(specifier) = edge.whole_reexport {
                if let Some(node) = self.inner.node_weight_mut(from) {
                    node.whole_reexports.insert(edge.to, specifier);
                }
            }
        }

        let entrypoints: BTreeSet<String> = entrypoints.iter().cloned().collect();

        debug!(
            "Built graph: {} modules, {} edges, {} entrypoints ({} edges dropped)",
            self.node_map.len(),
            self.inner.edge_count(),
            entrypoints.len(),
            dropped
        );

        DependencyGraph::from_parts(self.inner, self.node_map, entrypoints)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
