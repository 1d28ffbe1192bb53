//! Vorticity confinement: estimates each particle's local angular velocity
//! and applies a corrective force that restores rotational motion lost to
//! the position-based update.

use crate::kernels::{SmoothingKernel, SpikyKernel};
use crate::params::PbfParameters;
use crate::particles::Particles;
use crate::util::normalize_or_zero;
use crate::Vec3;

/// Angular velocity estimate at particle `i`, from the curl of the velocity
/// field sampled over its neighbors. Uses the reconstructed velocities and
/// the predicted positions of the current step.
pub fn vorticity(p: &Particles, params: &PbfParameters, i: usize) -> Vec3 {
    let x_i = p.predicted_position[i];
    let v_i = p.velocity[i];

    p.neighbors[i]
        .iter()
        .map(|&j| {
            let v_ij = p.velocity[j] - v_i;
            v_ij.cross(&SpikyKernel::gradient(x_i - p.predicted_position[j], params.h))
        })
        .sum()
}

/// Normalized gradient of the vorticity magnitude field. Falls back to the
/// zero vector in degenerate configurations (no neighbors, or a vanishing
/// gradient).
fn eta(p: &Particles, params: &PbfParameters, i: usize) -> Vec3 {
    let x_i = p.predicted_position[i];

    let total: Vec3 = p.neighbors[i]
        .iter()
        .map(|&j| {
            let grad = SpikyKernel::gradient(x_i - p.predicted_position[j], params.h);
            let rho_j = p.density[j].max(params.density_floor);
            grad * (p.mass[j] / rho_j * p.vorticity[j].magnitude())
        })
        .sum();

    normalize_or_zero(total)
}

/// The confinement force. Requires every particle's `vorticity` for the
/// current step to already be stored.
pub fn confinement_force(p: &Particles, params: &PbfParameters, i: usize) -> Vec3 {
    eta(p, params, i).cross(&p.vorticity[i]) * params.vorticity_epsilon
}
