//! XSPH viscosity: blends each particle's velocity toward its neighborhood
//! average, weighted by the density kernel.

use crate::kernels::{Poly6Kernel, SmoothingKernel};
use crate::params::PbfParameters;
use crate::particles::Particles;
use crate::Vec3;

/// Velocity-smoothing correction for particle `i`. Evaluated over committed
/// positions, since it runs after the velocity reconstruction and before the
/// position commit.
pub fn xsph_correction(p: &Particles, params: &PbfParameters, i: usize) -> Vec3 {
    let x_i = p.position[i];
    let v_i = p.velocity[i];

    let correction: Vec3 = p.neighbors[i]
        .iter()
        .map(|&j| (p.velocity[j] - v_i) * Poly6Kernel::value(x_i - p.position[j], params.h))
        .sum();

    correction * params.viscosity
}
