use crate::{Scalar, Vec3};

/// Normalizes `v`, returning the zero vector instead of NaNs when `v` has
/// zero (or denormal) length.
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let mag = v.magnitude();
    if mag > 0. {
        v / mag
    } else {
        Vec3::zeros()
    }
}

/// Component-wise clamp into the simulation domain
/// `[0, right_wall] x [0, 1] x [0, 1]`.
pub fn clamp_to_box(p: Vec3, right_wall: Scalar) -> Vec3 {
    Vec3::new(
        p.x.max(0.).min(right_wall),
        p.y.max(0.).min(1.),
        p.z.max(0.).min(1.),
    )
}
