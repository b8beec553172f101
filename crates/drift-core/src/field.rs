//! The [`VelocityField`] forcing capability trait.
//!
//! This is the view of the forcing that integration schemes and
//! behavior modules see: a velocity sampler at a fractional position
//! within the current model step, plus named scalar fields.

use crate::error::FieldError;

/// Samples forcing fields at particle positions for the current step.
///
/// Implementors hold state that is mutated in place between steps; a
/// caller must not retain values derived from a borrow of the field
/// across an update of the underlying provider.
pub trait VelocityField {
    /// Horizontal velocity `(u, v)` in m/s at `(x, y, z)`.
    ///
    /// `tstep` in `[0, 1]` is the fraction of the current model step:
    /// `0` samples the fields held for this step, `1` the fields of the
    /// next step.
    fn velocity(&self, x: f64, y: f64, z: f64, tstep: f64) -> (f64, f64);

    /// Nearest-neighbour sample of the scalar field `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnknownField`] if `name` was never
    /// registered with the provider.
    fn field(&self, x: f64, y: f64, z: f64, name: &str) -> Result<f64, FieldError>;

    /// [`velocity`](VelocityField::velocity) over paired slices.
    fn sample_velocity(&self, x: &[f64], y: &[f64], z: &[f64], tstep: f64) -> (Vec<f64>, Vec<f64>) {
        x.iter()
            .zip(y)
            .zip(z)
            .map(|((&x, &y), &z)| self.velocity(x, y, z, tstep))
            .unzip()
    }

    /// [`field`](VelocityField::field) over paired slices.
    fn sample_field(
        &self,
        x: &[f64],
        y: &[f64],
        z: &[f64],
        name: &str,
    ) -> Result<Vec<f64>, FieldError> {
        x.iter()
            .zip(y)
            .zip(z)
            .map(|((&x, &y), &z)| self.field(x, y, z, name))
            .collect()
    }
}
