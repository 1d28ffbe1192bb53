use crate::util::normalize_or_zero;
use crate::{Scalar, Vec3};

/// Kernel cutoff convention used throughout the solver: both the density
/// weight and the constraint gradient vanish at exactly `|r| == 0` and for
/// `|r| >= h`. The self-term of the density sum is therefore zero, and the
/// gradient never has to normalize a zero-length vector.
pub trait SmoothingKernel {
    fn value(_r: Vec3, _h: Scalar) -> Scalar {
        0.
    }

    fn gradient_mag(_r: Vec3, _h: Scalar) -> Scalar {
        0.
    }

    fn gradient(r: Vec3, h: Scalar) -> Vec3 {
        normalize_or_zero(r) * Self::gradient_mag(r, h)
    }
}

/// The poly6 kernel, used for density estimation and the tensile-instability
/// reference weight.
pub struct Poly6Kernel;

impl SmoothingKernel for Poly6Kernel {
    fn value(r: Vec3, h: Scalar) -> Scalar {
        let mag2 = r.magnitude_squared();

        if mag2 <= 0. || mag2 >= h * h {
            return 0.;
        }

        let c = 315. / (64. * std::f64::consts::PI * h.powi(9));
        c * (h * h - mag2).powi(3)
    }
}

/// The spiky kernel. Only its gradient is used: it weights the density
/// constraint gradient, the position corrections, and the vorticity estimate.
pub struct SpikyKernel;

impl SmoothingKernel for SpikyKernel {
    fn gradient_mag(r: Vec3, h: Scalar) -> Scalar {
        let r_mag = r.magnitude();

        if r_mag <= 0. || r_mag >= h {
            return 0.;
        }

        let c = -45. / (std::f64::consts::PI * h.powi(6));
        let h_sub_r = h - r_mag;
        c * h_sub_r * h_sub_r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: Scalar = 0.1;

    #[test]
    fn poly6_compact_support() {
        assert_eq!(Poly6Kernel::value(Vec3::new(H, 0., 0.), H), 0.);
        assert_eq!(Poly6Kernel::value(Vec3::new(0., 2. * H, 0.), H), 0.);
        assert_eq!(Poly6Kernel::value(Vec3::zeros(), H), 0.);

        let w = Poly6Kernel::value(Vec3::new(0.5 * H, 0., 0.), H);
        assert!(w > 0. && w.is_finite());
    }

    #[test]
    fn poly6_rotationally_symmetric() {
        let d = 0.6 * H;
        let w_x = Poly6Kernel::value(Vec3::new(d, 0., 0.), H);
        let w_y = Poly6Kernel::value(Vec3::new(0., d, 0.), H);
        let diag = d / (3.0f64).sqrt();
        let w_diag = Poly6Kernel::value(Vec3::new(diag, diag, diag), H);

        assert!((w_x - w_y).abs() < 1e-12);
        assert!((w_x - w_diag).abs() < 1e-12);
    }

    #[test]
    fn poly6_decreases_with_distance() {
        let w_near = Poly6Kernel::value(Vec3::new(0.2 * H, 0., 0.), H);
        let w_far = Poly6Kernel::value(Vec3::new(0.8 * H, 0., 0.), H);
        assert!(w_near > w_far);
        assert!(w_far > 0.);
    }

    #[test]
    fn spiky_gradient_compact_support() {
        assert_eq!(SpikyKernel::gradient(Vec3::new(H, 0., 0.), H), Vec3::zeros());
        assert_eq!(
            SpikyKernel::gradient(Vec3::new(0., 0., 3. * H), H),
            Vec3::zeros()
        );
        assert_eq!(SpikyKernel::gradient(Vec3::zeros(), H), Vec3::zeros());
    }

    #[test]
    fn spiky_gradient_points_toward_origin() {
        // Direction is -normalize(r): the correction pushes particles apart.
        let grad = SpikyKernel::gradient(Vec3::new(0.5 * H, 0., 0.), H);
        assert!(grad.x < 0.);
        assert_eq!(grad.y, 0.);
        assert_eq!(grad.z, 0.);
    }

    #[test]
    fn spiky_gradient_magnitude() {
        let r = Vec3::new(0.05, 0., 0.);
        let expected = 45. / (std::f64::consts::PI * H.powi(6)) * (H - 0.05) * (H - 0.05);
        let grad = SpikyKernel::gradient(r, H);
        assert!((grad.magnitude() - expected).abs() < 1e-9 * expected);
    }
}
