//! Force evaluation for t-SNE style embeddings.
//!
//! The gradient of the embedding cost splits into two parts:
//!
//! - **Non-edge (repulsive) forces** between every pair of points. These are approximated with
//!   Barnes-Hut: a subtree whose cell looks small from the query point (`max_width / dist < theta`)
//!   acts as a single point at its center of mass. The kernel is the unnormalised Student-t
//!   similarity `q = 1 / (1 + d^2)`; each summary adds `cum_size * q` to `sum_q` and
//!   `diff * cum_size * q^2` to the force.
//! - **Edge (attractive) forces** along the sparse similarity graph, given in compressed-row
//!   (CSR) form. These are exact and only need the point coordinates.
//!
//! The parallel passes give every point its own output row, so only `sum_q` needs combining.
//! It is reduced from per-point partial sums rather than shared behind a lock.
//!
//! # Example
//!
//! ```
//! use rs_sptree::sptree::{compute_gradient, SparseGraph, SpTree};
//! use rs_sptree::utils::{BarnesHutConfig, Points};
//!
//! let points = Points::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).expect("valid points");
//! let graph = SparseGraph::new(vec![0, 1, 2, 2], vec![1, 0], vec![0.5, 0.5]).expect("valid graph");
//! let tree = SpTree::new(&points).expect("tree builds");
//!
//! let gradient = compute_gradient(&tree, &graph, &BarnesHutConfig::default()).expect("forces");
//! assert_eq!(gradient.gradient.len(), 6);
//! assert!(gradient.sum_q > 0.0);
//! ```
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::sptree::{NodeId, SpTree, ROOT};
use crate::utils::{
    add_scaled, dot, sub_into, validate_theta, BarnesHutConfig, Points, SpTreeError, MIN_DISTANCE_SQ,
};

impl<'a> SpTree<'a> {
    /// Adds the Barnes-Hut repulsive force on point `point_index` to `neg_force`, and the
    /// matching kernel mass to `sum_q`.
    ///
    /// Both outputs are accumulated, not overwritten, so one `sum_q` can be carried across
    /// all points of a pass.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` for an unknown point, `DimensionMismatch` if `neg_force` is not
    /// `D` long, `InvalidTheta` for a negative or NaN theta.
    pub fn compute_non_edge_forces(
        &self,
        point_index: usize,
        theta: f64,
        neg_force: &mut [f64],
        sum_q: &mut f64,
    ) -> Result<(), SpTreeError> {
        let mut scratch = vec![0.0; self.dims()];
        self.compute_non_edge_forces_with_scratch(point_index, theta, &mut scratch, neg_force, sum_q)
    }

    /// Same as [`SpTree::compute_non_edge_forces`], but uses the caller's `D`-long `scratch`
    /// buffer instead of allocating one, so a loop over all points allocates nothing.
    ///
    /// ```
    /// use rs_sptree::sptree::SpTree;
    /// use rs_sptree::utils::Points;
    ///
    /// let points = Points::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).expect("valid points");
    /// let tree = SpTree::new(&points).expect("tree builds");
    ///
    /// let mut scratch = vec![0.0; 2];
    /// let mut forces = vec![0.0; 6];
    /// let mut sum_q = 0.0;
    /// for (i, out) in forces.chunks_mut(2).enumerate() {
    ///     tree.compute_non_edge_forces_with_scratch(i, 0.5, &mut scratch, out, &mut sum_q)
    ///         .expect("forces");
    /// }
    /// assert!(sum_q > 0.0);
    /// ```
    ///
    /// # Errors
    ///
    /// As [`SpTree::compute_non_edge_forces`]; `DimensionMismatch` also covers `scratch`.
    pub fn compute_non_edge_forces_with_scratch(
        &self,
        point_index: usize,
        theta: f64,
        scratch: &mut [f64],
        neg_force: &mut [f64],
        sum_q: &mut f64,
    ) -> Result<(), SpTreeError> {
        validate_theta(theta)?;
        self.check_point(point_index)?;
        for len in [neg_force.len(), scratch.len()] {
            if len != self.dims() {
                return Err(SpTreeError::DimensionMismatch { expected: self.dims(), actual: len });
            }
        }
        self.non_edge_forces_at(ROOT, point_index, theta, scratch, neg_force, sum_q);
        Ok(())
    }

    fn non_edge_forces_at(
        &self,
        node: NodeId,
        point_index: usize,
        theta: f64,
        buf: &mut [f64],
        neg_force: &mut [f64],
        sum_q: &mut f64,
    ) {
        let n = &self.nodes[node];

        // Skip empty cells and the leaf that holds the query point itself
        if n.cum_size() == 0 || (n.is_leaf() && n.indices() == [point_index]) {
            return;
        }

        sub_into(buf, self.points.row(point_index), n.center_of_mass());
        let dist_sq = dot(buf, buf);

        let max_width = n.boundary().max_width();
        if n.is_leaf() || max_width / dist_sq.sqrt() < theta {
            let q = 1.0 / (1.0 + dist_sq);
            let mult = n.cum_size() as f64 * q;
            *sum_q += mult;
            add_scaled(neg_force, buf, mult * q);
        } else if let Some(first) = n.first_child() {
            for child in first..first + self.num_children() {
                self.non_edge_forces_at(child, point_index, theta, buf, neg_force, sum_q);
            }
        }
    }

    /// Computes the repulsive force on every point and returns the total `sum_q`.
    ///
    /// `neg_forces` is a row-major `N x D` buffer and is overwritten. With the `parallel`
    /// feature the points are spread over the rayon thread pool.
    pub fn compute_all_non_edge_forces(&self, theta: f64, neg_forces: &mut [f64]) -> Result<f64, SpTreeError> {
        validate_theta(theta)?;
        let dims = self.dims();
        let expected = self.points.len() * dims;
        if neg_forces.len() != expected {
            return Err(SpTreeError::DimensionMismatch { expected, actual: neg_forces.len() });
        }
        neg_forces.iter_mut().for_each(|f| *f = 0.0);

        #[cfg(feature = "parallel")]
        let sum_q: f64 = neg_forces
            .par_chunks_mut(dims)
            .enumerate()
            .map_init(
                || vec![0.0; dims],
                |buf, (i, out)| {
                    let mut local = 0.0;
                    self.non_edge_forces_at(ROOT, i, theta, buf, out, &mut local);
                    local
                },
            )
            .sum();

        #[cfg(not(feature = "parallel"))]
        let sum_q = {
            let mut buf = vec![0.0; dims];
            let mut total = 0.0;
            for (i, out) in neg_forces.chunks_mut(dims).enumerate() {
                self.non_edge_forces_at(ROOT, i, theta, &mut buf, out, &mut total);
            }
            total
        };

        Ok(sum_q)
    }

    /// Exact attractive forces for the tree's points; see [`compute_edge_forces`].
    pub fn compute_edge_forces(
        &self,
        row_offsets: &[usize],
        col_indices: &[usize],
        values: &[f64],
        n: usize,
        pos_force: &mut [f64],
    ) -> Result<(), SpTreeError> {
        compute_edge_forces(self.points, row_offsets, col_indices, values, n, pos_force)
    }

    fn check_point(&self, index: usize) -> Result<(), SpTreeError> {
        if index >= self.points.len() {
            return Err(SpTreeError::IndexOutOfBounds { index, len: self.points.len() });
        }
        Ok(())
    }
}

/// A sparse similarity graph in compressed-row form.
///
/// Row `n` owns the edges `row_offsets[n]..row_offsets[n + 1]`; edge `i` points at
/// `col_indices[i]` with weight `values[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseGraph {
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseGraph {
    /// Wraps and validates a CSR triple.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the offsets are empty, decreasing, do not start at zero, or end
    /// past the edge arrays, or if `col_indices` and `values` differ in length.
    pub fn new(row_offsets: Vec<usize>, col_indices: Vec<usize>, values: Vec<f64>) -> Result<Self, SpTreeError> {
        if row_offsets.is_empty() {
            return Err(SpTreeError::InvalidArgument("row offsets must hold at least one entry".to_string()));
        }
        if row_offsets[0] != 0 {
            return Err(SpTreeError::InvalidArgument("row offsets must start at zero".to_string()));
        }
        let n = row_offsets.len() - 1;
        validate_csr(&row_offsets, &col_indices, &values, n)?;
        Ok(Self { row_offsets, col_indices, values })
    }

    /// Number of rows (source points).
    pub fn n_rows(&self) -> usize {
        self.row_offsets.len() - 1
    }

    /// Number of stored edges.
    pub fn nnz(&self) -> usize {
        self.row_offsets[self.n_rows()]
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `(column, weight)` pairs of row `n`.
    pub fn row(&self, n: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_offsets[n]..self.row_offsets[n + 1];
        self.col_indices[range.clone()].iter().copied().zip(self.values[range].iter().copied())
    }
}

fn validate_csr(row_offsets: &[usize], col_indices: &[usize], values: &[f64], n: usize) -> Result<(), SpTreeError> {
    if row_offsets.len() < n + 1 {
        return Err(SpTreeError::InvalidArgument(format!(
            "row offsets must have {} entries for {} rows, got {}",
            n + 1,
            n,
            row_offsets.len()
        )));
    }
    if col_indices.len() != values.len() {
        return Err(SpTreeError::InvalidArgument(format!(
            "column indices ({}) and values ({}) differ in length",
            col_indices.len(),
            values.len()
        )));
    }
    if row_offsets[..=n].windows(2).any(|w| w[0] > w[1]) {
        return Err(SpTreeError::InvalidArgument("row offsets must be non-decreasing".to_string()));
    }
    if row_offsets[n] > col_indices.len() {
        return Err(SpTreeError::InvalidArgument(format!(
            "row offsets reference {} edges but only {} are given",
            row_offsets[n],
            col_indices.len()
        )));
    }
    Ok(())
}

fn validate_edge_inputs(
    points: &Points,
    row_offsets: &[usize],
    col_indices: &[usize],
    values: &[f64],
    n: usize,
    pos_force: &[f64],
) -> Result<(), SpTreeError> {
    if n > points.len() {
        return Err(SpTreeError::IndexOutOfBounds { index: n - 1, len: points.len() });
    }
    validate_csr(row_offsets, col_indices, values, n)?;
    let expected = points.len() * points.dims();
    if pos_force.len() != expected {
        return Err(SpTreeError::DimensionMismatch { expected, actual: pos_force.len() });
    }
    let edges = &col_indices[row_offsets[0]..row_offsets[n]];
    if let Some(&index) = edges.iter().find(|&&j| j >= points.len()) {
        return Err(SpTreeError::IndexOutOfBounds { index, len: points.len() });
    }
    Ok(())
}

#[inline]
fn edge_forces_row(
    points: &Points,
    n: usize,
    edges: std::ops::Range<usize>,
    col_indices: &[usize],
    values: &[f64],
    min_distance_sq: f64,
    buf: &mut [f64],
    out: &mut [f64],
) {
    let point = points.row(n);
    for i in edges {
        sub_into(buf, point, points.row(col_indices[i]));
        let dist_sq = dot(buf, buf).max(min_distance_sq);
        add_scaled(out, buf, values[i] / dist_sq);
    }
}

/// Adds the exact attractive force of every edge of rows `0..n` to `pos_force`.
///
/// For an edge `n -> j` with weight `w`, `pos_force[n] += (y[n] - y[j]) * w / |y[n] - y[j]|^2`.
/// Squared distances are floored at [`MIN_DISTANCE_SQ`], so coincident points contribute
/// nothing instead of NaN. `pos_force` is a row-major `N x D` buffer.
///
/// All arguments are checked before anything is written.
///
/// # Errors
///
/// `InvalidArgument` for a malformed CSR triple, `IndexOutOfBounds` for a column or row past
/// the point set, `DimensionMismatch` for a wrongly sized `pos_force`.
///
/// # Examples
///
/// ```
/// use rs_sptree::sptree::compute_edge_forces;
/// use rs_sptree::utils::Points;
///
/// let points = Points::from_rows(&[[0.0, 0.0], [1.0, 0.0]]).expect("valid points");
/// let mut pos_force = vec![0.0; 4];
///
/// compute_edge_forces(&points, &[0, 1, 1], &[1], &[1.0], 2, &mut pos_force).expect("valid graph");
/// assert_eq!(pos_force, vec![-1.0, 0.0, 0.0, 0.0]);
/// ```
pub fn compute_edge_forces(
    points: &Points,
    row_offsets: &[usize],
    col_indices: &[usize],
    values: &[f64],
    n: usize,
    pos_force: &mut [f64],
) -> Result<(), SpTreeError> {
    compute_edge_forces_with_floor(points, row_offsets, col_indices, values, n, MIN_DISTANCE_SQ, pos_force)
}

/// [`compute_edge_forces`] with an explicit squared-distance floor.
pub fn compute_edge_forces_with_floor(
    points: &Points,
    row_offsets: &[usize],
    col_indices: &[usize],
    values: &[f64],
    n: usize,
    min_distance_sq: f64,
    pos_force: &mut [f64],
) -> Result<(), SpTreeError> {
    validate_edge_inputs(points, row_offsets, col_indices, values, n, pos_force)?;
    let dims = points.dims();
    let mut buf = vec![0.0; dims];
    for (row, out) in pos_force.chunks_mut(dims).take(n).enumerate() {
        edge_forces_row(
            points,
            row,
            row_offsets[row]..row_offsets[row + 1],
            col_indices,
            values,
            min_distance_sq,
            &mut buf,
            out,
        );
    }
    Ok(())
}

/// Attractive forces of a whole [`SparseGraph`], one row per rayon task.
///
/// Every row owns its output slot, so no synchronisation is needed. Results are
/// accumulated into `pos_force` like [`compute_edge_forces`].
#[cfg(feature = "parallel")]
pub fn compute_edge_forces_parallel(
    points: &Points,
    graph: &SparseGraph,
    min_distance_sq: f64,
    pos_force: &mut [f64],
) -> Result<(), SpTreeError> {
    let n = graph.n_rows();
    validate_edge_inputs(points, &graph.row_offsets, &graph.col_indices, &graph.values, n, pos_force)?;
    let dims = points.dims();
    pos_force
        .par_chunks_mut(dims)
        .take(n)
        .enumerate()
        .for_each_init(
            || vec![0.0; dims],
            |buf, (row, out)| {
                edge_forces_row(
                    points,
                    row,
                    graph.row_offsets[row]..graph.row_offsets[row + 1],
                    &graph.col_indices,
                    &graph.values,
                    min_distance_sq,
                    buf,
                    out,
                );
            },
        );
    Ok(())
}

/// Exact O(N^2) repulsive force on one point, for checking the tree against.
///
/// Adds to `neg_force` and `sum_q` exactly like [`SpTree::compute_non_edge_forces`] with
/// `theta = 0` on a point set without duplicates.
pub fn brute_force_non_edge_forces(
    points: &Points,
    point_index: usize,
    neg_force: &mut [f64],
    sum_q: &mut f64,
) -> Result<(), SpTreeError> {
    if point_index >= points.len() {
        return Err(SpTreeError::IndexOutOfBounds { index: point_index, len: points.len() });
    }
    if neg_force.len() != points.dims() {
        return Err(SpTreeError::DimensionMismatch { expected: points.dims(), actual: neg_force.len() });
    }
    let point = points.row(point_index);
    let mut buf = vec![0.0; points.dims()];
    for (j, other) in points.rows().enumerate() {
        if j == point_index {
            continue;
        }
        sub_into(&mut buf, point, other);
        let q = 1.0 / (1.0 + dot(&buf, &buf));
        *sum_q += q;
        add_scaled(neg_force, &buf, q * q);
    }
    Ok(())
}

/// Output of one full force pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    /// Attractive forces, row-major `N x D`.
    pub positive: Vec<f64>,
    /// Unnormalised repulsive forces, row-major `N x D`.
    pub negative: Vec<f64>,
    /// Sum of the Student-t kernel over all pairs.
    pub sum_q: f64,
    /// `positive - negative / sum_q`.
    pub gradient: Vec<f64>,
}

/// Runs the edge and non-edge passes over the tree's points and combines them.
///
/// This is the per-iteration call an embedding optimizer makes after rebuilding the tree.
///
/// # Errors
///
/// Propagates configuration, graph and shape errors from the individual passes. The graph
/// must have exactly one row per point.
pub fn compute_gradient(tree: &SpTree<'_>, graph: &SparseGraph, config: &BarnesHutConfig) -> Result<Gradient, SpTreeError> {
    config.validate()?;
    let points = tree.points();
    if graph.n_rows() != points.len() {
        return Err(SpTreeError::DimensionMismatch { expected: points.len(), actual: graph.n_rows() });
    }
    let len = points.len() * points.dims();

    let mut positive = vec![0.0; len];
    #[cfg(feature = "parallel")]
    compute_edge_forces_parallel(points, graph, config.min_distance_sq, &mut positive)?;
    #[cfg(not(feature = "parallel"))]
    compute_edge_forces_with_floor(
        points,
        graph.row_offsets(),
        graph.col_indices(),
        graph.values(),
        graph.n_rows(),
        config.min_distance_sq,
        &mut positive,
    )?;

    let mut negative = vec![0.0; len];
    let sum_q = tree.compute_all_non_edge_forces(config.theta, &mut negative)?;

    let gradient = if sum_q > 0.0 {
        positive.iter().zip(&negative).map(|(&p, &q)| p - q / sum_q).collect()
    } else {
        positive.clone()
    };

    Ok(Gradient { positive, negative, sum_q, gradient })
}
