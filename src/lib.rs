extern crate nalgebra as na;

pub mod forces;
pub mod grid;
pub mod kernels;
pub mod params;
pub mod particles;
pub mod simulation;
pub mod solver;
pub mod statistics;
pub mod util;
pub mod viscosity;
pub mod vorticity;

pub type Scalar = f64;
pub type Vec3 = na::Vector3<Scalar>;

pub use forces::{ConstantForce, ForceGenerator, ForceHandle, SpringForce};
pub use params::PbfParameters;
pub use simulation::{PbfSimulation, RenderParticle};
pub use statistics::SimulationStatistics;
