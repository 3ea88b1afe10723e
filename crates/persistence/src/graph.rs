//! GraphStore - in-process industry graph mirror
//!
//! Nodes and edges are keyed by stable identifiers; every write is an
//! idempotent upsert so re-mirroring a job never duplicates anything.

use std::collections::HashMap;
use std::sync::Mutex;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::Directed;
use tracing::{debug, instrument};

use contracts::{AnalysisResult, ContractError, GraphQuery, JobRecord};

/// Graph node payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Track {
        id: String,
        title: String,
        vibe: String,
        dissonance: f64,
    },
    Artist {
        id: String,
    },
    Concept {
        name: String,
    },
}

/// Graph edge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Performed,
    HasVibe,
}

/// Stable upsert key per node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Track(String),
    Artist(String),
    Concept(String),
}

#[derive(Default)]
struct GraphInner {
    graph: StableGraph<Node, Edge, Directed>,
    index: HashMap<NodeKey, NodeIndex>,
}

impl GraphInner {
    /// Insert or update a node, returning its index.
    fn upsert_node(&mut self, key: NodeKey, node: Node) -> NodeIndex {
        match self.index.get(&key) {
            Some(&idx) => {
                self.graph[idx] = node;
                idx
            }
            None => {
                let idx = self.graph.add_node(node);
                self.index.insert(key, idx);
                idx
            }
        }
    }

    /// Add an edge unless an identical one already exists.
    ///
    /// At most one edge kind connects any given node pair in this model, so
    /// `find_edge` is sufficient for idempotency.
    fn upsert_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: Edge) {
        if let Some(existing) = self.graph.find_edge(from, to) {
            if self.graph[existing] == edge {
                return;
            }
        }
        self.graph.add_edge(from, to, edge);
    }
}

/// Mutex-protected graph mirror shared across workers.
#[derive(Default)]
pub struct GraphStore {
    inner: Mutex<GraphInner>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror one completed job: track node, artist node, performed-by edge,
    /// vibe-concept node and has-vibe edge.
    #[instrument(name = "graph_store_mirror", skip(self, record, result), fields(job_id = %record.id))]
    pub fn mirror(&self, record: &JobRecord, result: &AnalysisResult) -> Result<(), ContractError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| ContractError::persistence("graph", "store lock poisoned"))?;

        let track_id = record.input.filename.clone();
        let vibe = result.vibe_descriptor().unwrap_or("Unknown").to_string();
        let dissonance = result.dissonance_score().unwrap_or(0.0);

        let track = inner.upsert_node(
            NodeKey::Track(track_id.clone()),
            Node::Track {
                id: track_id.clone(),
                title: track_id.clone(),
                vibe: vibe.clone(),
                dissonance,
            },
        );

        let artist_id = record.metadata.artist_id.clone();
        let artist = inner.upsert_node(
            NodeKey::Artist(artist_id.clone()),
            Node::Artist { id: artist_id },
        );
        inner.upsert_edge(artist, track, Edge::Performed);

        if vibe != "Unknown" {
            let concept_name = strip_qualifier(&vibe);
            let concept = inner.upsert_node(
                NodeKey::Concept(concept_name.clone()),
                Node::Concept { name: concept_name },
            );
            inner.upsert_edge(track, concept, Edge::HasVibe);
        }

        debug!(
            nodes = inner.graph.node_count(),
            edges = inner.graph.edge_count(),
            "graph mirror updated"
        );
        Ok(())
    }

    /// Node count (diagnostics/tests).
    pub fn edge_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.graph.edge_count())
            .unwrap_or(0)
    }
}

impl GraphQuery for GraphStore {
    /// Degree centrality: degree / (n - 1), the fraction of other nodes the
    /// artist touches.
    fn artist_centrality(&self, artist_id: &str) -> f64 {
        let inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(_) => return 0.0,
        };

        let n = inner.graph.node_count();
        if n < 2 {
            return 0.0;
        }

        let Some(&idx) = inner.index.get(&NodeKey::Artist(artist_id.to_string())) else {
            return 0.0;
        };

        let degree = inner
            .graph
            .neighbors_undirected(idx)
            .count();
        degree as f64 / (n - 1) as f64
    }

    fn node_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.graph.node_count())
            .unwrap_or(0)
    }
}

/// Strip a parenthetical qualifier: "Anthemic Joy (Aligned)" -> "Anthemic Joy".
fn strip_qualifier(vibe: &str) -> String {
    vibe.split('(').next().unwrap_or(vibe).trim().to_string()
}
