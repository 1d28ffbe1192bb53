//! The simulation orchestrator: owns the particle store, the force-generator
//! list, and the spatial grid, and drives the fixed per-step PBF pipeline.

use crate::forces::{ForceGenerator, ForceHandle};
use crate::grid::Grid;
use crate::params::PbfParameters;
use crate::particles::Particles;
use crate::util::clamp_to_box;
use crate::{solver, viscosity, vorticity};
use crate::{Scalar, Vec3};
use itertools::izip;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-particle data handed to the external renderer: position for placement,
/// density for color mapping, and the highlight flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderParticle {
    pub position: [f32; 3],
    pub highlight: bool,
    pub density: f32,
}

/// Position-Based Fluids simulation state.
///
/// `advance_time` and `reset` take `&mut self`, so exclusive access to the
/// particle array during a step is enforced by the borrow checker; callers
/// sharing a simulation across threads must serialize access themselves.
/// Force generators may only be added or removed between steps.
pub struct PbfSimulation {
    pub particles: Particles,
    pub params: PbfParameters,
    /// Elapsed simulation time.
    pub time: Scalar,
    grid: Grid,
    forces: Vec<(u64, Box<dyn ForceGenerator>)>,
    next_force_id: u64,
}

impl PbfSimulation {
    pub fn new(params: PbfParameters) -> Self {
        params.validate();
        let grid = Grid::new(params.grid_size);
        PbfSimulation {
            particles: Particles::default(),
            params,
            time: 0.,
            grid,
            forces: Vec::new(),
            next_force_id: 0,
        }
    }

    /// Creates a particle at `position` (clamped into the domain box) and
    /// returns its handle. Particles are never implicitly destroyed.
    pub fn create_particle(&mut self, position: Vec3) -> usize {
        let position = clamp_to_box(position, self.params.right_wall);
        self.particles
            .add_particle(self.params.particle_mass, position)
    }

    /// Registers a force generator until removed.
    pub fn add_force(&mut self, generator: Box<dyn ForceGenerator>) -> ForceHandle {
        let id = self.next_force_id;
        self.next_force_id += 1;
        self.forces.push((id, generator));
        ForceHandle(id)
    }

    /// Removes a previously registered generator. Useful for temporary
    /// forces, such as user-interaction springs. Returns whether the handle
    /// was still registered.
    pub fn remove_force(&mut self, handle: ForceHandle) -> bool {
        let before = self.forces.len();
        self.forces.retain(|(id, _)| *id != handle.0);
        self.forces.len() != before
    }

    pub fn set_highlight(&mut self, particle: usize, highlight: bool) {
        self.particles.highlight[particle] = highlight;
    }

    /// Moves every particle back to its creation position, zeroes velocities
    /// and force accumulators, clears highlights, and rewinds time to zero.
    pub fn reset(&mut self) {
        let particles = &mut self.particles;
        for i in 0..particles.len() {
            particles.position[i] = particles.rest_position[i];
            particles.predicted_position[i] = particles.rest_position[i];
            particles.velocity[i] = Vec3::zeros();
            particles.force[i] = Vec3::zeros();
            particles.highlight[i] = false;
        }
        self.time = 0.;
    }

    /// The particle closest to `query` by squared distance, or `None` when
    /// the simulation has no particles.
    pub fn nearest_particle(&self, query: Vec3) -> Option<usize> {
        self.particles
            .position
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (query - *a).magnitude_squared();
                let db = (query - *b).magnitude_squared();
                da.partial_cmp(&db).expect("particle positions are finite")
            })
            .map(|(i, _)| i)
    }

    /// Snapshot of the render-facing particle state.
    pub fn render_data(&self) -> Vec<RenderParticle> {
        izip!(
            &self.particles.position,
            &self.particles.highlight,
            &self.particles.density
        )
        .map(|(pos, &highlight, &density)| RenderParticle {
            position: [pos.x as f32, pos.y as f32, pos.z as f32],
            highlight,
            density: density as f32,
        })
        .collect()
    }

    /// Advances the simulation by one step of size `dt`.
    ///
    /// The pipeline order is fixed: external forces and gravity, position
    /// prediction, neighbor search, the incompressibility solve, velocity
    /// reconstruction, vorticity confinement and XSPH viscosity, commit. The
    /// per-particle passes within each stage are independent; the stage
    /// boundaries are the only synchronization points.
    pub fn advance_time(&mut self, dt: Scalar) {
        assert!(
            dt > 0. && dt.is_finite(),
            "advance_time requires a positive, finite dt, got {}",
            dt
        );
        // Parameters are public and may be tuned between steps (e.g. the
        // movable right wall), so the preconditions are re-checked per step.
        self.params.validate();

        let n = self.particles.len();
        let h = self.params.h;
        let right_wall = self.params.right_wall;

        // 1. Accumulate external forces, then gravity.
        for f in &mut self.particles.force {
            *f = Vec3::zeros();
        }
        for (_, generator) in &self.forces {
            generator.apply_force(&mut self.particles);
        }
        for (f, &m) in self
            .particles
            .force
            .iter_mut()
            .zip(&self.particles.mass)
        {
            f.y -= m * self.params.gravity;
        }

        // 2. Predict positions.
        for i in 0..n {
            let m = self.particles.mass[i];
            self.particles.velocity[i] += dt * self.particles.force[i] / m;
            self.particles.predicted_position[i] = clamp_to_box(
                self.particles.position[i] + dt * self.particles.velocity[i],
                right_wall,
            );
        }

        // 3. Rebuild the grid from the predicted positions and gather every
        // particle's neighbor set for the step.
        self.grid.clear();
        for i in 0..n {
            self.grid.insert(i, self.particles.predicted_position[i]);
        }
        self.particles.neighbors = {
            let grid = &self.grid;
            let positions = &self.particles.predicted_position;
            (0..n)
                .into_par_iter()
                .map(|i| grid.neighbors(i, positions, h))
                .collect()
        };

        // 4. Project out the density constraints.
        solver::project(&mut self.particles, &self.params);

        // 5. Reconstruct velocities from the corrected positions.
        for i in 0..n {
            self.particles.velocity[i] =
                (self.particles.predicted_position[i] - self.particles.position[i]) / dt;
        }

        // 6. Vorticity confinement and XSPH viscosity. All vorticities are
        // stored before any confinement force reads a neighbor's.
        self.particles.vorticity = {
            let p = &self.particles;
            let params = &self.params;
            (0..n)
                .into_par_iter()
                .map(|i| vorticity::vorticity(p, params, i))
                .collect()
        };
        let velocity_corrections: Vec<Vec3> = {
            let p = &self.particles;
            let params = &self.params;
            (0..n)
                .into_par_iter()
                .map(|i| {
                    dt * vorticity::confinement_force(p, params, i) / p.mass[i]
                        + viscosity::xsph_correction(p, params, i)
                })
                .collect()
        };
        for i in 0..n {
            self.particles.velocity[i] += velocity_corrections[i];
        }

        // 7. Commit.
        for i in 0..n {
            self.particles.position[i] = self.particles.predicted_position[i];
        }

        // 8. The grid contents are stale from here on; the next step rebuilds
        // them from scratch.
        self.time += dt;
    }
}
