// demos/embedding_step.rs

use log::info;
use rs_sptree::sptree::{compute_gradient, SparseGraph, SpTree};
use rs_sptree::utils::{BarnesHutConfig, Points, SpTreeError};

fn main() -> Result<(), SpTreeError> {
    env_logger::init();

    // Two clusters of points on a circle, each point linked to its neighbours
    let n = 200;
    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let angle = i as f64 / n as f64 * std::f64::consts::TAU;
        let offset = if i % 2 == 0 { 5.0 } else { -5.0 };
        rows.push([angle.cos() + offset, angle.sin()]);
    }
    let mut points = Points::from_rows(&rows)?;

    let mut row_offsets = vec![0];
    let mut col_indices = Vec::new();
    for i in 0..n {
        col_indices.push((i + 2) % n);
        col_indices.push((i + n - 2) % n);
        row_offsets.push(col_indices.len());
    }
    let values = vec![1.0 / col_indices.len() as f64; col_indices.len()];
    let graph = SparseGraph::new(row_offsets, col_indices, values)?;

    let config = BarnesHutConfig::new(Some(0.5), None, None);
    let learning_rate = 200.0;

    // A few plain gradient-descent steps; the tree is rebuilt after every move
    for step in 0..10 {
        let gradient = {
            let tree = SpTree::with_config(&points, &config)?;
            info!("step {}: {} nodes, depth {}", step, tree.node_count(), tree.depth());
            compute_gradient(&tree, &graph, &config)?
        };

        let norm = gradient.gradient.iter().map(|g| g * g).sum::<f64>().sqrt();
        println!("step {:2}: sum_q = {:10.4}, |gradient| = {:.6}", step, gradient.sum_q, norm);

        for (y, g) in points.as_mut_slice().iter_mut().zip(&gradient.gradient) {
            *y -= learning_rate * g;
        }
    }

    println!("First point after descent: {:?}", points.row(0));
    Ok(())
}
