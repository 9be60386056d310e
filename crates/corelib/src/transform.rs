use crate::{EulerRot, Mat4, Quat, Vec3};

/// Rigid transform with uniform or non-uniform scale (Euler XYZ).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians (XYZ order).
    pub rotation_euler: Vec3,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    /// Unscaled placement: position plus Euler rotation.
    #[inline]
    pub const fn placed(translation: Vec3, rotation_euler: Vec3) -> Self {
        Self {
            translation,
            rotation_euler,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation_euler.x,
            self.rotation_euler.y,
            self.rotation_euler.z,
        )
    }

    /// Build matrix = T * R * S (column-major Mat4 per glam).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.translation)
    }

    /// Object-space +Z rotated into world space; the facing of a plane.
    #[inline]
    pub fn facing(&self) -> Vec3 {
        self.rotation() * Vec3::Z
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
