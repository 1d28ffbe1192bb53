use crate::particles::Particles;
use crate::{Scalar, Vec3};

/// An external force generator. Generators are registered with the
/// simulation and invoked once per step, after the force accumulators have
/// been zeroed and before gravity is added.
pub trait ForceGenerator: Send {
    /// Accumulates this generator's contribution into the particles' force
    /// accumulators.
    fn apply_force(&self, particles: &mut Particles);

    /// Hook for the external renderer to draw this force (e.g. a drag
    /// spring). The core never calls it.
    fn render_hook(&self) {}
}

/// Identifies a registered force generator, for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForceHandle(pub(crate) u64);

/// Applies a constant force to every particle.
pub struct ConstantForce {
    pub force: Vec3,
}

impl ForceGenerator for ConstantForce {
    fn apply_force(&self, particles: &mut Particles) {
        for f in &mut particles.force {
            *f += self.force;
        }
    }
}

/// A user-interaction spring pulling one particle toward an anchor point.
pub struct SpringForce {
    pub particle: usize,
    pub anchor: Vec3,
    pub stiffness: Scalar,
}

impl ForceGenerator for SpringForce {
    fn apply_force(&self, particles: &mut Particles) {
        let displacement = self.anchor - particles.position[self.particle];
        particles.force[self.particle] += self.stiffness * displacement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_force_accumulates() {
        let mut particles = Particles::default();
        particles.add_particle(1., Vec3::new(0.5, 0.5, 0.5));
        particles.add_particle(1., Vec3::new(0.4, 0.5, 0.5));

        let gen = ConstantForce {
            force: Vec3::new(0., -2., 0.),
        };
        gen.apply_force(&mut particles);
        gen.apply_force(&mut particles);

        assert_eq!(particles.force[0], Vec3::new(0., -4., 0.));
        assert_eq!(particles.force[1], Vec3::new(0., -4., 0.));
    }

    #[test]
    fn spring_pulls_toward_anchor() {
        let mut particles = Particles::default();
        particles.add_particle(1., Vec3::new(0.5, 0.5, 0.5));

        let spring = SpringForce {
            particle: 0,
            anchor: Vec3::new(0.9, 0.5, 0.5),
            stiffness: 10.,
        };
        spring.apply_force(&mut particles);

        assert!(particles.force[0].x > 0.);
        assert_eq!(particles.force[0].y, 0.);
    }
}
