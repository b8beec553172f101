//! [`ParticleBatch`]: the unit of particle release.

use indexmap::IndexMap;

use crate::error::BatchError;
use crate::id::Pid;

/// A column-oriented batch of freshly released particles.
///
/// Every column has one entry per particle. Pids are consecutive and
/// increasing; `attributes` carries any extra per-particle values from
/// the release table (e.g. `super`, `release_time`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleBatch {
    /// Particle ids, consecutive and increasing.
    pub pid: Vec<Pid>,
    /// Grid X coordinates.
    pub x: Vec<f64>,
    /// Grid Y coordinates.
    pub y: Vec<f64>,
    /// Depths, positive down.
    pub z: Vec<f64>,
    /// Extra named per-particle values.
    pub attributes: IndexMap<String, Vec<f64>>,
}

impl ParticleBatch {
    /// Number of particles in the batch.
    pub fn len(&self) -> usize {
        self.pid.len()
    }

    /// Whether the batch holds no particles.
    pub fn is_empty(&self) -> bool {
        self.pid.is_empty()
    }

    /// Check that every column has one entry per particle and that the
    /// pids are consecutive.
    pub fn validate(&self) -> Result<(), BatchError> {
        let n = self.len();
        let columns = [("X", self.x.len()), ("Y", self.y.len()), ("Z", self.z.len())];
        let attrs = self.attributes.iter().map(|(k, v)| (k.as_str(), v.len()));
        for (column, found) in columns.into_iter().chain(attrs) {
            if found != n {
                return Err(BatchError::LengthMismatch {
                    column: column.to_string(),
                    expected: n,
                    found,
                });
            }
        }
        for pair in self.pid.windows(2) {
            if pair[1] != pair[0].next() {
                return Err(BatchError::PidOrder {
                    expected: pair[0].next(),
                    found: pair[1],
                });
            }
        }
        Ok(())
    }

    /// Move every particle of `other` onto the end of this batch.
    ///
    /// Attribute columns missing on either side are zero-filled so the
    /// result stays rectangular.
    pub fn extend(&mut self, other: ParticleBatch) {
        let before = self.len();
        let added = other.len();
        self.pid.extend(other.pid);
        self.x.extend(other.x);
        self.y.extend(other.y);
        self.z.extend(other.z);
        for (name, values) in other.attributes {
            self.attributes
                .entry(name)
                .or_insert_with(|| vec![0.0; before])
                .extend(values);
        }
        for values in self.attributes.values_mut() {
            values.resize(before + added, 0.0);
        }
    }
}
