//! Barnes-Hut space-partitioning trees for force-directed embeddings.
//!
//! [`sptree::SpTree`] partitions `D`-dimensional points into a `2^D`-ary tree of
//! [`sptree::Cell`]s and evaluates the repulsive t-SNE forces in `O(N log N)`.
//! [`sptree::compute_edge_forces`] evaluates the attractive forces over a sparse
//! similarity graph, and [`sptree::compute_gradient`] runs both passes.
pub mod utils;
pub mod sptree;
