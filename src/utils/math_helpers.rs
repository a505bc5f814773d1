/// Writes `a - b` into `out`. All three slices must have the same length.
#[inline]
pub fn sub_into(out: &mut [f64], a: &[f64], b: &[f64]) {
    debug_assert!(a.len() == b.len() && out.len() == a.len());
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x - y;
    }
}

#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

/// `acc += v * scale`
#[inline]
pub fn add_scaled(acc: &mut [f64], v: &[f64], scale: f64) {
    for (a, &x) in acc.iter_mut().zip(v) {
        *a += x * scale;
    }
}

/// Squared Euclidean distance, without a scratch buffer.
#[inline]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| (x - y) * (x - y)).sum()
}

/// Largest element, or 0.0 for an empty slice. Intended for non-negative widths.
#[inline]
pub fn max_element(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |m, &x| if x > m { x } else { m })
}

/// Updates a running mean of `count - 1` samples to include `sample`.
///
/// Applies `mean = mean * (count - 1) / count + sample / count`.
#[inline]
pub fn running_mean_update(mean: &mut [f64], sample: &[f64], count: usize) {
    let count = count as f64;
    let keep = (count - 1.0) / count;
    let add = 1.0 / count;
    for (m, &x) in mean.iter_mut().zip(sample) {
        *m = *m * keep + x * add;
    }
}
