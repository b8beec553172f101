//! Interpolation helpers shared by grid backends and forcing samplers.
//!
//! Arrays are flat, row-major (`j` outer, `i` inner). Fractional array
//! coordinates are clamped onto the array before sampling, so lookups
//! never extrapolate and never index out of bounds.

/// Lower index, upper index and upper weight of a fractional coordinate
/// along an axis of `len` points.
fn axis_stencil(f: f64, len: usize) -> (usize, usize, f64) {
    if len < 2 || f.is_nan() {
        return (0, 0, 0.0);
    }
    let f = f.clamp(0.0, (len - 1) as f64);
    let i = (f.floor() as usize).min(len - 2);
    (i, i + 1, f - i as f64)
}

/// Bilinear interpolation of `values` (`nx` columns, `ny` rows) at the
/// fractional array coordinate `(fx, fy)`.
pub fn bilinear(values: &[f64], nx: usize, ny: usize, fx: f64, fy: f64) -> f64 {
    bilinear_by(nx, ny, fx, fy, |flat| values[flat])
}

/// Bilinear interpolation where node values come from `at(flat_index)`.
///
/// Lets callers interpolate a derived quantity (e.g. `u + t * du`)
/// without materialising it.
pub fn bilinear_by(nx: usize, ny: usize, fx: f64, fy: f64, at: impl Fn(usize) -> f64) -> f64 {
    let (i0, i1, p) = axis_stencil(fx, nx);
    let (j0, j1, q) = axis_stencil(fy, ny);
    let node = |i: usize, j: usize| at(j * nx + i);
    (1.0 - q) * ((1.0 - p) * node(i0, j0) + p * node(i1, j0))
        + q * ((1.0 - p) * node(i0, j1) + p * node(i1, j1))
}

/// Vertical stencil of depth `z` in a column of layer-centre depths.
///
/// Returns `(lower, upper, w)` such that a field value at `z` is
/// `w * f[lower] + (1 - w) * f[upper]`. Depths above the top layer or
/// below the bottom layer are clipped to that layer.
///
/// `layers` must be non-empty and non-decreasing.
pub fn vertical_stencil(layers: &[f64], z: f64) -> (usize, usize, f64) {
    let n = layers.len();
    if n <= 1 || z.is_nan() || z <= layers[0] {
        return (0, 0, 1.0);
    }
    if z >= layers[n - 1] {
        return (n - 1, n - 1, 1.0);
    }
    // layers[k - 1] <= z < layers[k], with 1 <= k <= n - 1.
    let k = layers.partition_point(|&d| d <= z);
    let (lo, hi) = (k - 1, k);
    let w = (layers[hi] - z) / (layers[hi] - layers[lo]);
    (lo, hi, w)
}

/// Index of the layer nearest to depth `z`.
pub fn nearest_layer(layers: &[f64], z: f64) -> usize {
    let (lo, hi, w) = vertical_stencil(layers, z);
    if w >= 0.5 {
        lo
    } else {
        hi
    }
}
