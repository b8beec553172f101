//! Rectangular coordinate extents in grid space.

/// An axis-aligned rectangle in grid coordinates.
///
/// Used for the navigable domain of a grid: [`contains`](Extent::contains)
/// is strict, so a particle sitting exactly on the boundary is outside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    /// Lower X bound.
    pub xmin: f64,
    /// Upper X bound.
    pub xmax: f64,
    /// Lower Y bound.
    pub ymin: f64,
    /// Upper Y bound.
    pub ymax: f64,
}

impl Extent {
    /// Create an extent. Bounds are taken as given.
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Whether `(x, y)` lies strictly inside the rectangle.
    ///
    /// NaN coordinates are never inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.xmin < x && x < self.xmax && self.ymin < y && y < self.ymax
    }

    /// Clamp `(x, y)` onto the closed rectangle.
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(self.xmin, self.xmax), y.clamp(self.ymin, self.ymax))
    }
}
