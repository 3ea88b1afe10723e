//! GraphQuery trait - read side of the graph mirror
//!
//! The industry stage consumes centrality lookups through this interface so
//! stage crates never depend on the storage engine directly.

/// Read-only queries over the mirrored industry graph.
pub trait GraphQuery: Send + Sync {
    /// Degree centrality of the artist node, 0.0 when the artist is unknown.
    fn artist_centrality(&self, artist_id: &str) -> f64;

    /// Total node count (used for diagnostics).
    fn node_count(&self) -> usize;
}
