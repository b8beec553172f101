//! Horizontal random-walk diffusion.
//!
//! Adds an independent zero-mean Gaussian velocity with standard
//! deviation `sqrt(2 D / dt)` to each horizontal component. The RNG is
//! a ChaCha8 stream seeded from `seed XOR step`, so a run is
//! bit-reproducible for a fixed seed and particle order.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Random velocity perturbation for a constant horizontal diffusivity.
#[derive(Clone, Debug, PartialEq)]
pub struct Diffusion {
    diffusivity: f64,
    sigma: f64,
    seed: u64,
}

impl Diffusion {
    /// Diffusion for diffusivity `d` (m²/s) at time step `dt` (s).
    ///
    /// The caller validates `d >= 0` and `dt > 0`.
    pub fn new(d: f64, dt: f64, seed: u64) -> Self {
        Self {
            diffusivity: d,
            sigma: (2.0 * d / dt).sqrt(),
            seed,
        }
    }

    /// Horizontal diffusivity in m²/s.
    pub fn diffusivity(&self) -> f64 {
        self.diffusivity
    }

    /// Standard deviation of each velocity component in m/s.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// The random stream for model step `step`.
    pub fn rng(&self, step: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed ^ step)
    }

    /// Draw one `(u, v)` perturbation.
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> (f64, f64) {
        (
            self.sigma * box_muller(rng),
            self.sigma * box_muller(rng),
        )
    }
}

/// Standard normal sample by the Box-Muller transform.
fn box_muller(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-300); // avoid ln(0)
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigma_follows_diffusivity_and_step() {
        assert_relative_eq!(Diffusion::new(50.0, 100.0, 0).sigma(), 1.0);
        assert_eq!(Diffusion::new(0.0, 600.0, 0).sigma(), 0.0);
    }

    #[test]
    fn same_step_same_stream() {
        let d = Diffusion::new(10.0, 600.0, 42);
        let a: Vec<_> = {
            let mut rng = d.rng(7);
            (0..5).map(|_| d.sample(&mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = d.rng(7);
            (0..5).map(|_| d.sample(&mut rng)).collect()
        };
        let c: Vec<_> = {
            let mut rng = d.rng(8);
            (0..5).map(|_| d.sample(&mut rng)).collect()
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn samples_have_the_configured_spread() {
        let d = Diffusion::new(0.5, 1.0, 3);
        let mut rng = d.rng(0);
        let n = 20_000;
        let draws: Vec<f64> = (0..n)
            .flat_map(|_| {
                let (u, v) = d.sample(&mut rng);
                [u, v]
            })
            .collect();
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.1, "variance {var}");
    }
}
