use crate::utils;

/// Padding added to the root half-widths so that extreme points sit strictly inside.
pub const BOUNDARY_EPSILON: f64 = 1e-5;

/// Floor applied to squared distances in the edge-force kernel.
pub const MIN_DISTANCE_SQ: f64 = 1e-12;

/// Number of point indices a leaf holds before it subdivides.
pub const QT_NODE_CAPACITY: usize = 1;

pub const DEFAULT_BARNES_HUT_CONFIG: utils::BarnesHutConfig = utils::BarnesHutConfig {
    theta: 0.5,
    boundary_epsilon: BOUNDARY_EPSILON,
    min_distance_sq: MIN_DISTANCE_SQ,
};
