//! Coordinate-space conversion.
//!
//! Z3D files are Y-up. Decoded scenes are Z-up and right-handed: the
//! stream's `(x, y, z)` becomes `(x, -z, y)`, a +90° rotation about X.

use glam::{Mat4, Vec3, Vec4};

/// Rotation taking Z3D space into scene space.
pub const AXIS_CONVERSION: Mat4 = Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::NEG_Y, Vec4::W);

/// −90° about X, applied on the local side of every object matrix.
const LOCAL_ROTATION: Mat4 = Mat4::from_cols(Vec4::X, Vec4::NEG_Z, Vec4::Y, Vec4::W);

/// Convert a position or normal read in stream order.
///
/// The stream's middle component is the up axis and lands in Z; the
/// stream's last component is negated into Y.
#[must_use]
pub fn convert_vector([x, z, y]: [f32; 3]) -> Vec3 {
    Vec3::new(x, -y, z)
}

/// Turn a raw column-major object matrix into a placement matrix.
///
/// Some exporters write identity matrices as a rotation combined with a
/// scale of −1 on every axis. The format has no way to author that
/// deliberately, so such matrices are replaced by identity.
#[must_use]
pub fn placement_from_stream(local: Mat4) -> Mat4 {
    let placement = AXIS_CONVERSION * local * LOCAL_ROTATION;
    if is_fully_mirrored(&placement) {
        tracing::debug!("Replacing fully mirrored local matrix with identity");
        Mat4::IDENTITY
    } else {
        placement
    }
}

/// Per-axis scale with signs.
///
/// Magnitudes are the basis vector lengths; an axis is negative when its
/// basis vector points away from the axis it maps.
#[must_use]
pub fn signed_scale(matrix: &Mat4) -> Vec3 {
    let axes = [matrix.x_axis, matrix.y_axis, matrix.z_axis];
    let scale: [f32; 3] = std::array::from_fn(|i| {
        let axis = axes[i].truncate();
        axis.length().copysign(axis[i])
    });
    Vec3::from_array(scale)
}

/// An orientation-reversing matrix whose scale is negative on all three axes.
#[must_use]
pub fn is_fully_mirrored(matrix: &Mat4) -> bool {
    matrix.determinant() < 0.0 && signed_scale(matrix).cmplt(Vec3::ZERO).all()
}

/// Inverse of `matrix`, or identity when it cannot be inverted.
#[must_use]
pub fn inverse_or_identity(matrix: &Mat4) -> Mat4 {
    let det = matrix.determinant();
    if det.is_finite() && det.abs() > f32::EPSILON {
        matrix.inverse()
    } else {
        Mat4::IDENTITY
    }
}
