use crate::{Scalar, Vec3};

/// Contains all of the per-particle state, stored struct-of-arrays. Particles
/// are identified by their index, which is stable: particles are only ever
/// appended, never removed.
pub struct Particles {
    pub mass: Vec<Scalar>,
    /// Committed position, updated once per step.
    pub position: Vec<Vec3>,
    /// Creation position, restored by `PbfSimulation::reset`.
    pub rest_position: Vec<Vec3>,
    /// Tentative position, mutated by the constraint solver before commit.
    pub predicted_position: Vec<Vec3>,
    pub velocity: Vec<Vec3>,
    /// Force accumulator, zeroed at the start of every step.
    pub force: Vec<Vec3>,
    /// Kernel-weighted density from the last solver pass.
    pub density: Vec<Scalar>,
    /// Density-constraint multiplier, overwritten every solver iteration.
    pub lambda: Vec<Scalar>,
    /// Position correction from the last solver iteration.
    pub position_correction: Vec<Vec3>,
    /// Local angular velocity estimate, recomputed once per step.
    pub vorticity: Vec<Vec3>,
    /// Indices of particles within the smoothing radius. Never contains the
    /// particle's own index; valid only for the step it was built in.
    pub neighbors: Vec<Vec<usize>>,
    /// Set by the external caller, consumed only by the renderer.
    pub highlight: Vec<bool>,
}

impl Default for Particles {
    fn default() -> Self {
        Self {
            mass: Vec::new(),
            position: Vec::new(),
            rest_position: Vec::new(),
            predicted_position: Vec::new(),
            velocity: Vec::new(),
            force: Vec::new(),
            density: Vec::new(),
            lambda: Vec::new(),
            position_correction: Vec::new(),
            vorticity: Vec::new(),
            neighbors: Vec::new(),
            highlight: Vec::new(),
        }
    }
}

impl Particles {
    /// Appends a new particle at rest at `position` and returns its index.
    pub(crate) fn add_particle(&mut self, mass: Scalar, position: Vec3) -> usize {
        assert!(
            mass > 0. && mass.is_finite(),
            "particle mass must be positive and finite, got {}",
            mass
        );

        let index = self.mass.len();
        self.mass.push(mass);
        self.position.push(position);
        self.rest_position.push(position);
        self.predicted_position.push(position);
        self.velocity.push(Vec3::zeros());
        self.force.push(Vec3::zeros());
        self.density.push(0.);
        self.lambda.push(0.);
        self.position_correction.push(Vec3::zeros());
        self.vorticity.push(Vec3::zeros());
        self.neighbors.push(Vec::new());
        self.highlight.push(false);
        index
    }

    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    pub fn total_mass(&self) -> Scalar {
        self.mass.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_particle_returns_sequential_indices() {
        let mut particles = Particles::default();
        assert_eq!(particles.add_particle(1., Vec3::new(0.1, 0.2, 0.3)), 0);
        assert_eq!(particles.add_particle(1., Vec3::new(0.4, 0.5, 0.6)), 1);
        assert_eq!(particles.len(), 2);
        assert_eq!(particles.rest_position[1], Vec3::new(0.4, 0.5, 0.6));
        assert_eq!(particles.velocity[0], Vec3::zeros());
    }

    #[test]
    #[should_panic]
    fn rejects_non_positive_mass() {
        let mut particles = Particles::default();
        particles.add_particle(0., Vec3::zeros());
    }
}
