use crate::Scalar;
use serde::{Deserialize, Serialize};

/// A struct containing all of the high-level parameters for the PBF
/// simulation. All fields are plain tunables; the defaults reproduce the
/// canonical dam-break setup in the unit box.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PbfParameters {
    /// The radius of the smoothing kernel.
    pub h: Scalar,
    /// The density the constraint solver drives the fluid toward.
    pub rest_density: Scalar,
    /// Number of Jacobi iterations of the incompressibility solver per step.
    pub solver_iterations: usize,
    /// The nominal time step.
    pub delta_time: Scalar,
    /// Constraint-force mixing term added to the gradient sum in the lambda
    /// denominator; keeps nearly isolated particles from blowing up.
    pub relaxation: Scalar,
    /// Strength of the tensile-instability (artificial pressure) correction.
    pub s_corr: Scalar,
    /// Reference offset for the tensile-instability correction, as an
    /// absolute displacement along one axis.
    pub delta_q: Scalar,
    /// Exponent of the tensile-instability correction.
    pub s_corr_exponent: i32,
    /// The XSPH viscosity coefficient.
    pub viscosity: Scalar,
    /// Vorticity confinement strength.
    pub vorticity_epsilon: Scalar,
    /// Lower bound used when dividing by a neighbor's density in the
    /// vorticity confinement force.
    pub density_floor: Scalar,
    /// Number of spatial hash cells along each axis of the unit domain.
    pub grid_size: usize,
    /// Magnitude of gravity, applied along -y.
    pub gravity: Scalar,
    /// Mass given to newly created particles.
    pub particle_mass: Scalar,
    /// x-coordinate of the movable right wall. The domain is
    /// `[0, right_wall] x [0, 1] x [0, 1]`; may be changed between steps to
    /// narrow the box interactively.
    pub right_wall: Scalar,
}

impl Default for PbfParameters {
    fn default() -> Self {
        Self {
            h: 0.1,
            rest_density: 6378.,
            solver_iterations: 4,
            delta_time: 0.0083,
            relaxation: 600.,
            s_corr: 1e-4,
            delta_q: 0.03,
            s_corr_exponent: 4,
            viscosity: 0.01,
            vorticity_epsilon: 5e-4,
            density_floor: 1e-6,
            grid_size: 10,
            gravity: 10.,
            particle_mass: 1.,
            right_wall: 1.,
        }
    }
}

impl PbfParameters {
    /// Checks the fail-fast preconditions from the configuration contract.
    /// Called once when the simulation is constructed; violating these is a
    /// caller bug, not a recoverable error.
    pub(crate) fn validate(&self) {
        assert!(self.h > 0. && self.h.is_finite(), "h must be positive");
        assert!(self.rest_density > 0., "rest density must be positive");
        assert!(self.particle_mass > 0., "particle mass must be positive");
        assert!(self.grid_size > 0, "grid size must be positive");
        assert!(
            self.h * self.grid_size as Scalar <= 1.,
            "kernel radius ({}) must not exceed the grid cell width ({}); \
             the 3x3x3 neighbor scan would silently drop true neighbors",
            self.h,
            1. / self.grid_size as Scalar
        );
        assert!(
            self.right_wall > 0. && self.right_wall <= 1.,
            "right wall must lie in (0, 1]"
        );
        assert!(self.relaxation > 0., "relaxation epsilon must be positive");
    }
}
