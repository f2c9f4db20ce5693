// Module dependency graph

mod builder;

pub use builder::{EdgeExtractor, GraphBuilder, ImportEdge};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::ops::Deref;
use std::sync::Arc;

/// Node weight: one per module present in the graph
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub path: String,

    /// Minimum number of import edges from any entrypoint, `None` if unreachable
    pub depth: Option<usize>,

    /// Importee path -> specifier of a bare `export * from '...'` statement
    pub whole_reexports: BTreeMap<String, String>,
}

impl ModuleNode {
    fn new(path: String) -> Self {
        Self {
            path,
            depth: None,
            whole_reexports: BTreeMap::new(),
        }
    }
}

/// Owned view of a module's position in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub path: String,
    /// Modules this module imports
    pub to: BTreeSet<String>,
    /// Modules importing this module
    pub from: BTreeSet<String>,
    pub depth: Option<usize>,
    pub whole_reexports: BTreeMap<String, String>,
}

impl Vertex {
    pub fn is_reachable(&self) -> bool {
        self.depth.is_some()
    }
}

/// Read-only graph state shared by [`DependencyGraph`] and [`GraphSnapshot`].
///
/// Edges live in a petgraph `StableDiGraph` so removing a module keeps every
/// other node index valid, and `to`/`from` are always derived from the same
/// edge set, which keeps them mutually consistent.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    inner: StableDiGraph<ModuleNode, ()>,
    node_map: HashMap<String, NodeIndex>,
    entrypoints: BTreeSet<String>,
}

impl ModuleGraph {
    /// Get the vertex for a module
    pub fn vertex(&self, path: &str) -> Option<Vertex> {
        let idx = *self.node_map.get(path)?;
        let node = self.inner.node_weight(idx)?;
        Some(Vertex {
            path: node.path.clone(),
            to: self.neighbors(idx, Direction::Outgoing),
            from: self.neighbors(idx, Direction::Incoming),
            depth: node.depth,
            whole_reexports: node.whole_reexports.clone(),
        })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.node_map.contains_key(path)
    }

    /// Depth of a module. Outer `None` means the module is not in the graph
    pub fn depth(&self, path: &str) -> Option<Option<usize>> {
        self.node(path).map(|n| n.depth)
    }

    /// Modules that import `path`
    pub fn importers(&self, path: &str) -> BTreeSet<String> {
        self.node_map
            .get(path)
            .map(|&idx| self.neighbors(idx, Direction::Incoming))
            .unwrap_or_default()
    }

    /// Modules imported by `path`
    pub fn importees(&self, path: &str) -> BTreeSet<String> {
        self.node_map
            .get(path)
            .map(|&idx| self.neighbors(idx, Direction::Outgoing))
            .unwrap_or_default()
    }

    /// Specifier of `from`'s `export * from '...'` statement pointing at `to`
    pub fn whole_reexport_specifier(&self, from: &str, to: &str) -> Option<&str> {
        self.node(from)?.whole_reexports.get(to).map(String::as_str)
    }

    pub fn is_entrypoint(&self, path: &str) -> bool {
        self.entrypoints.contains(path)
    }

    pub fn entrypoints(&self) -> &BTreeSet<String> {
        &self.entrypoints
    }

    /// Paths of all modules in the graph, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.node_map.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn node(&self, path: &str) -> Option<&ModuleNode> {
        let idx = *self.node_map.get(path)?;
        self.inner.node_weight(idx)
    }

    fn neighbors(&self, idx: NodeIndex, direction: Direction) -> BTreeSet<String> {
        self.inner
            .edges_directed(idx, direction)
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                self.inner.node_weight(other).map(|n| n.path.clone())
            })
            .collect()
    }

    /// Breadth-first traversal from every entrypoint, assigning minimum depth
    fn compute_depths(&mut self) {
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();

        for entry in &self.entrypoints {
            if let Some(&idx) = self.node_map.get(entry) {
                if visited.insert(idx) {
                    queue.push_back((idx, 0usize));
                }
            }
        }

        while let Some((idx, depth)) = queue.pop_front() {
            if let Some(node) = self.inner.node_weight_mut(idx) {
                node.depth = Some(depth);
            }
            let next: Vec<NodeIndex> = self
                .inner
                .neighbors_directed(idx, Direction::Outgoing)
                .collect();
            for target in next {
                if visited.insert(target) {
                    queue.push_back((target, depth + 1));
                }
            }
        }
    }
}

/// Immutable snapshot of the graph, cheap to clone and safe to send to workers
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    inner: Arc<ModuleGraph>,
}

impl Deref for GraphSnapshot {
    type Target = ModuleGraph;

    fn deref(&self) -> &ModuleGraph {
        &self.inner
    }
}

/// The mutable dependency graph owned by the engine
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    inner: Arc<ModuleGraph>,
}

impl DependencyGraph {
    /// Build the graph from module paths, entrypoints and raw import edges
    pub fn build<I, S>(modules: I, entrypoints: &[String], edges: &[ImportEdge]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = GraphBuilder::new();
        for path in modules {
            builder.add_module(path);
        }
        for edge in edges {
            builder.add_edge(edge.clone());
        }
        builder.build(entrypoints)
    }

    pub(crate) fn from_parts(
        inner: StableDiGraph<ModuleNode, ()>,
        node_map: HashMap<String, NodeIndex>,
        entrypoints: BTreeSet<String>,
    ) -> Self {
        let mut graph = ModuleGraph {
            inner,
            node_map,
            entrypoints,
        };
        graph.compute_depths();
        Self {
            inner: Arc::new(graph),
        }
    }

    /// Remove a module and every edge touching it.
    ///
    /// Also drops whole-reexport entries other modules held for it.
    /// Returns `false` if the module was not in the graph.
    pub fn delete_vertex(&mut self, path: &str) -> bool {
        if !self.inner.contains(path) {
            return false;
        }
        let graph = Arc::make_mut(&mut self.inner);
        let Some(idx) = graph.node_map.remove(path) else {
            return false;
        };

        let importers: Vec<NodeIndex> = graph
            .inner
            .neighbors_directed(idx, Direction::Incoming)
            .collect();
        for importer in importers {
            if let Some(node) = graph.inner.node_weight_mut(importer) {
                node.whole_reexports.remove(path);
            }
        }

        graph.inner.remove_node(idx).is_some()
    }

    /// Record that `from` contains `export * from '<specifier>'` resolving to `to`
    pub fn record_whole_reexport(&mut self, from: &str, to: &str, specifier: &str) -> bool {
        let Some(&idx) = self.inner.node_map.get(from) else {
            return false;
        };
        let graph = Arc::make_mut(&mut self.inner);
        match graph.inner.node_weight_mut(idx) {
            Some(node) => {
                node.whole_reexports
                    .insert(to.to_string(), specifier.to_string());
                true
            }
            None => false,
        }
    }

    /// Take an immutable snapshot of the current graph
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Deref for DependencyGraph {
    type Target = ModuleGraph;

    fn deref(&self) -> &ModuleGraph {
        &self.inner
    }
}
