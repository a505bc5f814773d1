//! A `2^D`-ary space-partitioning tree over a borrowed point set.
//!
//! The tree generalises the quadtree/octree to any dimension: every internal node splits its
//! [`Cell`] into `2^D` equal sub-cells. Nodes live in a single arena (`Vec<SpNode>`) and refer
//! to each other by [`NodeId`]. Children of a node are stored contiguously, so
//! [`SpTree::children`] is a plain slice, and the parent link is an index that never owns anything.
//!
//! Every node keeps a running center of mass and the number of points in its subtree, which is
//! all the Barnes-Hut force evaluation in [`crate::sptree::forces`] needs.
//!
//! # Example
//!
//! ```
//! use rs_sptree::sptree::SpTree;
//! use rs_sptree::utils::Points;
//!
//! let points = Points::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]])
//!     .expect("valid points");
//! let tree = SpTree::new(&points).expect("tree builds");
//!
//! assert_eq!(tree.cum_size(), 4);
//! assert_eq!(tree.center_of_mass(), &[0.5, 0.5]);
//! assert!(tree.is_correct());
//! ```
use log::{debug, error, log_enabled, trace, Level};

use crate::sptree::Cell;
use crate::utils::{running_mean_update, BarnesHutConfig, Points, SpTreeError, QT_NODE_CAPACITY};

/// Index of a node inside an [`SpTree`] arena.
pub type NodeId = usize;

/// Id of the root node of every tree.
pub const ROOT: NodeId = 0;

/// Largest supported dimensionality.
///
/// Every subdivision allocates all `2^D` children up front, each with its own boundary and
/// center-of-mass vectors, so memory grows as `2^D` per internal node. At this cap a split
/// creates 256 nodes.
pub const MAX_DIMS: usize = 8;

/// A single node of the tree.
#[derive(Debug, Clone)]
pub struct SpNode {
    boundary: Cell,
    is_leaf: bool,
    index: [usize; QT_NODE_CAPACITY],
    size: usize,
    cum_size: usize,
    center_of_mass: Vec<f64>,
    first_child: Option<NodeId>,
    parent: Option<NodeId>,
}

impl SpNode {
    fn leaf(boundary: Cell, parent: Option<NodeId>) -> Self {
        let dims = boundary.dims();
        Self {
            boundary,
            is_leaf: true,
            index: [0; QT_NODE_CAPACITY],
            size: 0,
            cum_size: 0,
            center_of_mass: vec![0.0; dims],
            first_child: None,
            parent,
        }
    }

    pub fn boundary(&self) -> &Cell {
        &self.boundary
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Point indices held directly by this node. Always empty for internal nodes.
    pub fn indices(&self) -> &[usize] {
        &self.index[..self.size]
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of points inserted into this subtree, including collapsed duplicates.
    pub fn cum_size(&self) -> usize {
        self.cum_size
    }

    pub fn center_of_mass(&self) -> &[f64] {
        &self.center_of_mass
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Barnes-Hut space-partitioning tree.
///
/// The tree borrows its points, so the borrow checker rules out moving the points while
/// the tree is alive. Rebuild the tree after every optimizer step.
#[derive(Debug, Clone)]
pub struct SpTree<'a> {
    pub(crate) points: &'a Points,
    dims: usize,
    num_children: usize,
    pub(crate) nodes: Vec<SpNode>,
}

impl<'a> SpTree<'a> {
    /// Builds a tree over every point in `points` with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`SpTree::with_config`].
    pub fn new(points: &'a Points) -> Result<Self, SpTreeError> {
        Self::with_config(points, &BarnesHutConfig::default())
    }

    /// Builds a tree over every point in `points`.
    ///
    /// The root cell is centered on the mean of the points, and each half-width is the
    /// largest distance from the mean to the extreme coordinate on that axis, plus
    /// `config.boundary_epsilon`. Points are then inserted in index order.
    ///
    /// # Errors
    ///
    /// - `EmptyPointSet` if there are no points.
    /// - `InvalidArgument` for more than [`MAX_DIMS`] dimensions or an invalid config.
    /// - `NonFiniteCoordinate` if any coordinate is NaN or infinite.
    /// - `InsertionRejected` if a point falls outside the root cell.
    pub fn with_config(points: &'a Points, config: &BarnesHutConfig) -> Result<Self, SpTreeError> {
        config.validate()?;
        if points.is_empty() {
            return Err(SpTreeError::EmptyPointSet);
        }
        let dims = points.dims();
        check_dims(dims)?;
        if let Some(index) = points.first_non_finite() {
            return Err(SpTreeError::NonFiniteCoordinate { index });
        }

        let mean = points.mean();
        let min = points.min();
        let max = points.max();
        let width = mean
            .iter()
            .zip(min.iter().zip(&max))
            .map(|(&m, (&lo, &hi))| (hi - m).max(m - lo) + config.boundary_epsilon)
            .collect();

        let mut tree = Self::with_boundary(points, Cell::new(mean, width)?)?;
        tree.fill(points.len())?;

        if log_enabled!(Level::Debug) {
            debug!(
                "Built space-partitioning tree: points={}, dims={}, nodes={}, depth={}",
                points.len(),
                dims,
                tree.nodes.len(),
                tree.depth()
            );
        }
        Ok(tree)
    }

    /// Creates an empty tree whose root covers `boundary`. No points are inserted.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `boundary` and `points` differ in dimensionality,
    /// `InvalidArgument` for more than [`MAX_DIMS`] dimensions.
    pub fn with_boundary(points: &'a Points, boundary: Cell) -> Result<Self, SpTreeError> {
        let dims = points.dims();
        if boundary.dims() != dims {
            return Err(SpTreeError::DimensionMismatch { expected: dims, actual: boundary.dims() });
        }
        check_dims(dims)?;
        Ok(Self {
            points,
            dims,
            num_children: 1 << dims,
            nodes: vec![SpNode::leaf(boundary, None)],
        })
    }

    fn fill(&mut self, n: usize) -> Result<(), SpTreeError> {
        for index in 0..n {
            if !self.insert(index)? {
                error!("Point {} lies outside the root boundary", index);
                return Err(SpTreeError::InsertionRejected { index });
            }
        }
        Ok(())
    }

    /// Inserts point `index` into the tree.
    ///
    /// Returns `Ok(false)` if the point lies outside the root cell, in which case nothing
    /// changes. Points equal to an already stored point on every coordinate are counted
    /// in the sizes and centers of mass but not stored again.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` for an unknown point.
    pub fn insert(&mut self, index: usize) -> Result<bool, SpTreeError> {
        if index >= self.points.len() {
            return Err(SpTreeError::IndexOutOfBounds { index, len: self.points.len() });
        }
        if !self.nodes[ROOT].boundary.contains(self.points.row(index)) {
            return Ok(false);
        }
        self.insert_at(ROOT, index);
        Ok(true)
    }

    // Below the root a point descends by `Cell::child_index` alone. Re-testing containment
    // against the children's rounded bounds can reject a point on a shared face.
    fn insert_at(&mut self, mut node: NodeId, index: usize) {
        let points = self.points;
        let point = points.row(index);

        loop {
            let n = &mut self.nodes[node];
            n.cum_size += 1;
            running_mean_update(&mut n.center_of_mass, point, n.cum_size);

            if n.is_leaf {
                if n.size < QT_NODE_CAPACITY {
                    n.index[n.size] = index;
                    n.size += 1;
                    return;
                }
                // Exact duplicates collapse into the leaf that already holds them, and so
                // does anything the cell can no longer tell apart at f64 resolution.
                if !n.boundary.can_subdivide() || n.indices().iter().any(|&held| points.row(held) == point) {
                    return;
                }
                self.split(node);
            }

            node = self.child_for(node, point);
        }
    }

    /// Child of `node` that owns `point`. A leaf is its own owner.
    fn child_for(&self, node: NodeId, point: &[f64]) -> NodeId {
        let n = &self.nodes[node];
        match n.first_child {
            Some(first) => first + n.boundary.child_index(point),
            None => node,
        }
    }

    /// Splits leaf `node` into `2^D` children and moves its stored points into them.
    ///
    /// The node's `cum_size` and center of mass are unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `node` does not exist or is already internal.
    pub fn subdivide(&mut self, node: NodeId) -> Result<(), SpTreeError> {
        match self.nodes.get(node) {
            Some(n) if n.is_leaf => {}
            Some(_) => {
                return Err(SpTreeError::InvalidArgument(format!("node {} is already subdivided", node)));
            }
            None => {
                return Err(SpTreeError::InvalidArgument(format!("node {} does not exist", node)));
            }
        }
        self.split(node);
        Ok(())
    }

    fn split(&mut self, node: NodeId) {
        let first = self.nodes.len();
        let children: Vec<SpNode> = (0..self.num_children)
            .map(|i| SpNode::leaf(self.nodes[node].boundary.subdivide(i), Some(node)))
            .collect();
        self.nodes.extend(children);

        let (held, size) = {
            let n = &mut self.nodes[node];
            n.first_child = Some(first);
            n.is_leaf = false;
            let held = (n.index, n.size);
            n.size = 0;
            held
        };

        for &index in &held[..size] {
            let child = self.child_for(node, self.points.row(index));
            self.insert_at(child, index);
        }
        trace!("Subdivided node {} into children {}..{}", node, first, first + self.num_children);
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Children per internal node, `2^D`.
    pub fn num_children(&self) -> usize {
        self.num_children
    }

    pub fn points(&self) -> &'a Points {
        self.points
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> &SpNode {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> Option<&SpNode> {
        self.nodes.get(id)
    }

    /// Children of `id` in partition order. Empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[SpNode] {
        match self.nodes.get(id).and_then(|n| n.first_child) {
            Some(first) => &self.nodes[first..first + self.num_children],
            None => &[],
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn cum_size(&self) -> usize {
        self.root().cum_size
    }

    pub fn center_of_mass(&self) -> &[f64] {
        &self.root().center_of_mass
    }

    /// Leaf that owns `point`, or `None` if the point lies outside the root cell.
    pub fn locate(&self, point: &[f64]) -> Option<NodeId> {
        if point.len() != self.dims || !self.nodes[ROOT].boundary.contains(point) {
            return None;
        }
        let mut node = ROOT;
        while !self.nodes[node].is_leaf {
            node = self.child_for(node, point);
        }
        Some(node)
    }

    /// Checks that every stored point lies inside the root cell and is held by the leaf that
    /// owns it, and that every node is either a leaf without children or an empty internal
    /// node with a full set of children.
    pub fn is_correct(&self) -> bool {
        self.is_correct_at(ROOT)
    }

    fn is_correct_at(&self, node: NodeId) -> bool {
        let n = &self.nodes[node];
        if !n.indices().iter().all(|&i| self.locate(self.points.row(i)) == Some(node)) {
            return false;
        }
        match (n.is_leaf, n.first_child) {
            (true, None) => true,
            (false, Some(first)) => {
                n.size == 0 && (first..first + self.num_children).all(|c| self.is_correct_at(c))
            }
            _ => false,
        }
    }

    /// Number of nodes on the longest root-to-leaf path. A lone leaf has depth 1.
    pub fn depth(&self) -> usize {
        self.depth_at(ROOT)
    }

    fn depth_at(&self, node: NodeId) -> usize {
        match self.nodes[node].first_child {
            None => 1,
            Some(first) => {
                1 + (first..first + self.num_children)
                    .map(|c| self.depth_at(c))
                    .max()
                    .unwrap_or(0)
            }
        }
    }
}

fn check_dims(dims: usize) -> Result<(), SpTreeError> {
    if dims > MAX_DIMS {
        return Err(SpTreeError::InvalidArgument(format!(
            "at most {} dimensions are supported, got {}",
            MAX_DIMS, dims
        )));
    }
    Ok(())
}
