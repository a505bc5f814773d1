use approx::assert_relative_eq;
use crate::sptree::Cell;
use crate::utils::SpTreeError;

#[test]
fn test_cell_contains() {
    let cell = Cell::new(vec![1.0, -1.0], vec![0.5, 2.0]).unwrap();

    // Points inside the cell
    assert!(cell.contains(&[1.0, -1.0]));
    assert!(cell.contains(&[0.6, 0.9]));

    // Faces are inclusive
    assert!(cell.contains(&[1.5, -3.0]));
    assert!(cell.contains(&[0.5, 1.0]));

    // Points outside the cell
    assert!(!cell.contains(&[1.51, -1.0]));
    assert!(!cell.contains(&[1.0, 1.01]));
}

#[test]
fn test_cell_zero_width_contains_only_its_corner() {
    let cell = Cell::new(vec![2.0], vec![0.0]).unwrap();
    assert!(cell.contains(&[2.0]));
    assert!(!cell.contains(&[2.0 + 1e-12]));
}

#[test]
fn test_cell_subdivide_sign_selection() {
    let cell = Cell::new(vec![0.0, 0.0, 0.0], vec![2.0, 4.0, 8.0]).unwrap();

    // Bit d of the child index selects the negative side along axis d
    let c0 = cell.subdivide(0b000);
    assert_eq!(c0.corner(), &[1.0, 2.0, 4.0]);
    let c5 = cell.subdivide(0b101);
    assert_eq!(c5.corner(), &[-1.0, 2.0, -4.0]);
    let c7 = cell.subdivide(0b111);
    assert_eq!(c7.corner(), &[-1.0, -2.0, -4.0]);

    for i in 0..8 {
        assert_eq!(cell.subdivide(i).width(), &[1.0, 2.0, 4.0]);
    }
}

#[test]
fn test_cell_subdivide_tiles_parent() {
    let parent = Cell::new(vec![0.5, -2.0, 3.0], vec![1.5, 0.25, 2.0]).unwrap();
    let children: Vec<Cell> = (0..8).map(|i| parent.subdivide(i)).collect();

    // Children are distinct and their volumes add up to the parent's
    for (i, a) in children.iter().enumerate() {
        for b in &children[i + 1..] {
            assert_ne!(a.corner(), b.corner());
        }
    }
    let volume = |c: &Cell| c.width().iter().product::<f64>();
    let total: f64 = children.iter().map(volume).sum();
    assert_relative_eq!(total, volume(&parent), epsilon = 1e-12);

    // Every child stays inside the parent: both its extremes are contained
    for child in &children {
        let lo: Vec<f64> = child.corner().iter().zip(child.width()).map(|(c, w)| c - w).collect();
        let hi: Vec<f64> = child.corner().iter().zip(child.width()).map(|(c, w)| c + w).collect();
        assert!(parent.contains(&lo));
        assert!(parent.contains(&hi));
    }

    // Sample points land in the child picked by child_index
    for &p in &[[0.5, -2.0, 3.0], [-0.9, -1.8, 4.9], [1.99, -2.24, 1.01]] {
        assert!(parent.contains(&p));
        assert!(children[parent.child_index(&p)].contains(&p));
    }
}

#[test]
fn test_cell_max_width() {
    let cell = Cell::new(vec![0.0, 0.0, 0.0], vec![0.5, 3.0, 1.0]).unwrap();
    assert_eq!(cell.max_width(), 3.0);
    assert_eq!(cell.dims(), 3);
}

#[test]
fn test_cell_new_rejects_bad_shapes() {
    assert_eq!(
        Cell::new(vec![0.0, 0.0], vec![1.0]),
        Err(SpTreeError::DimensionMismatch { expected: 2, actual: 1 })
    );
    assert!(matches!(Cell::new(vec![0.0, 0.0], vec![1.0, -0.5]), Err(SpTreeError::InvalidArgument(_))));
    assert!(matches!(Cell::new(vec![0.0], vec![f64::NAN]), Err(SpTreeError::InvalidArgument(_))));
    assert!(Cell::new(vec![0.0], vec![0.0]).is_ok());
}

#[test]
fn test_cell_child_index_matches_subdivide_order() {
    let cell = Cell::new(vec![0.0, 0.0, 0.0], vec![2.0, 4.0, 8.0]).unwrap();

    assert_eq!(cell.child_index(&[1.0, 1.0, 1.0]), 0b000);
    assert_eq!(cell.child_index(&[-1.0, 1.0, -1.0]), 0b101);
    assert_eq!(cell.child_index(&[-1.0, -1.0, -1.0]), 0b111);

    // A point on the center plane goes to the + side
    assert_eq!(cell.child_index(&[0.0, -1.0, 0.0]), 0b010);

    for p in [[1.5, -3.0, 7.0], [-0.1, 0.2, -8.0], [-2.0, -4.0, 0.0]] {
        let child = cell.subdivide(cell.child_index(&p));
        assert!(child.contains(&p));
    }
}

#[test]
fn test_cell_can_subdivide_until_f64_resolution() {
    let cell = Cell::new(vec![1.0, 1.0], vec![0.5, 0.5]).unwrap();
    assert!(cell.can_subdivide());

    // Halving this width no longer moves the center
    let tiny = Cell::new(vec![1.0, 1.0], vec![1e-300, 0.0]).unwrap();
    assert!(!tiny.can_subdivide());

    // One axis that still moves is enough
    let mixed = Cell::new(vec![1.0, 0.0], vec![0.0, 1e-300]).unwrap();
    assert!(mixed.can_subdivide());
}
