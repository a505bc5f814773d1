use crate::utils::SpTreeError;

/// An axis-aligned box in `D` dimensions.
///
/// A `Cell` is described by its center (`corner`) and one half-width per axis, so
/// it spans `corner[d] - width[d] ..= corner[d] + width[d]` along every dimension `d`.
/// Both bounds are inclusive. Neighbouring cells produced by [`Cell::subdivide`] share
/// their faces; [`Cell::child_index`] decides which of them owns a point on a shared face.
///
/// # Examples
///
/// ```
/// use rs_sptree::sptree::Cell;
///
/// let cell = Cell::new(vec![0.0, 0.0], vec![1.0, 1.0]).expect("valid cell");
///
/// assert!(cell.contains(&[0.5, -0.5]));
/// assert!(cell.contains(&[1.0, 0.0]));  // faces are inclusive
/// assert!(!cell.contains(&[1.5, 0.0]));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    corner: Vec<f64>,
    width: Vec<f64>,
}

impl Cell {
    /// Creates a cell from its center and half-widths.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `width` is not as long as `corner`, `InvalidArgument` for a
    /// negative or NaN half-width.
    pub fn new(corner: Vec<f64>, width: Vec<f64>) -> Result<Self, SpTreeError> {
        if corner.len() != width.len() {
            return Err(SpTreeError::DimensionMismatch { expected: corner.len(), actual: width.len() });
        }
        if let Some(w) = width.iter().find(|w| !(**w >= 0.0)) {
            return Err(SpTreeError::InvalidArgument(format!("half-width must be non-negative, got {}", w)));
        }
        Ok(Self { corner, width })
    }

    pub fn dims(&self) -> usize {
        self.corner.len()
    }

    pub fn corner(&self) -> &[f64] {
        &self.corner
    }

    pub fn width(&self) -> &[f64] {
        &self.width
    }

    /// Returns true if `|point[d] - corner[d]| <= width[d]` on every axis.
    #[inline]
    pub fn contains(&self, point: &[f64]) -> bool {
        point
            .iter()
            .zip(self.corner.iter().zip(&self.width))
            .all(|(&p, (&c, &w))| (p - c).abs() <= w)
    }

    /// Returns the `child`-th of the `2^D` equal sub-cells.
    ///
    /// Bit `d` of `child` picks the side along axis `d`: a set bit moves the center by
    /// `-width[d] / 2`, a clear bit by `+width[d] / 2`. Every half-width is halved.
    ///
    /// ```
    /// use rs_sptree::sptree::Cell;
    ///
    /// let cell = Cell::new(vec![0.0, 0.0], vec![1.0, 1.0]).expect("valid cell");
    ///
    /// let first = cell.subdivide(0);
    /// assert_eq!(first.corner(), &[0.5, 0.5]);
    /// assert_eq!(first.width(), &[0.5, 0.5]);
    ///
    /// let last = cell.subdivide(3);
    /// assert_eq!(last.corner(), &[-0.5, -0.5]);
    /// ```
    pub fn subdivide(&self, child: usize) -> Cell {
        let mut corner = Vec::with_capacity(self.dims());
        let mut width = Vec::with_capacity(self.dims());
        for (d, (&c, &w)) in self.corner.iter().zip(&self.width).enumerate() {
            let half = 0.5 * w;
            width.push(half);
            if (child >> d) & 1 == 1 {
                corner.push(c - half);
            } else {
                corner.push(c + half);
            }
        }
        Cell { corner, width }
    }

    /// Index of the sub-cell that owns `point`, in [`Cell::subdivide`] order.
    ///
    /// Bit `d` is set when `point[d] < corner[d]`, so a point on a shared face goes to the
    /// `+` side. The choice depends only on this cell's center, never on the children's
    /// rounded bounds, so every point inside the cell maps to exactly one child.
    #[inline]
    pub fn child_index(&self, point: &[f64]) -> usize {
        let mut child = 0;
        for (d, (&p, &c)) in point.iter().zip(&self.corner).enumerate() {
            if p < c {
                child |= 1 << d;
            }
        }
        child
    }

    /// Returns false once halving no longer moves the center on any axis, i.e. the cell is
    /// at the resolution limit of `f64` and its children would all coincide with it.
    pub fn can_subdivide(&self) -> bool {
        self.corner
            .iter()
            .zip(&self.width)
            .any(|(&c, &w)| c + 0.5 * w != c || c - 0.5 * w != c)
    }

    /// Largest half-width over all axes.
    #[inline]
    pub fn max_width(&self) -> f64 {
        crate::utils::max_element(&self.width)
    }
}
