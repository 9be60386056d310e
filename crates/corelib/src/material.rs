//! Surface appearance: a color map plus fixed shading constants.

use asset::{Texture, TextureId};

use crate::Vec3;

pub const SURFACE_ROUGHNESS: f32 = 0.4;
pub const SURFACE_METALNESS: f32 = 0.1;
/// 0x202020
pub const SURFACE_EMISSIVE: Vec3 = Vec3::splat(0x20 as f32 / 255.0);
pub const SURFACE_EMISSIVE_INTENSITY: f32 = 0.3;

/// Standard (metal/rough) material bound to one surface.
#[derive(Clone, Debug)]
pub struct SurfaceMaterial {
    map: Texture,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    needs_update: bool,
}

impl SurfaceMaterial {
    /// Build the room material around `map`. New materials start dirty so
    /// the renderer uploads them on first sight.
    pub fn standard(map: Texture) -> Self {
        Self {
            map,
            roughness: SURFACE_ROUGHNESS,
            metalness: SURFACE_METALNESS,
            emissive: SURFACE_EMISSIVE,
            emissive_intensity: SURFACE_EMISSIVE_INTENSITY,
            needs_update: true,
        }
    }

    #[inline]
    pub fn map(&self) -> &Texture {
        &self.map
    }

    #[inline]
    pub fn map_id(&self) -> TextureId {
        self.map.id()
    }

    /// Rebind the color map and mark the material dirty. Returns the
    /// texture that was bound before.
    pub fn set_map(&mut self, map: Texture) -> Texture {
        self.needs_update = true;
        std::mem::replace(&mut self.map, map)
    }

    #[inline]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Clear and return the dirty flag; the renderer calls this once it has
    /// uploaded the current map.
    #[inline]
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }

    /// Emissive color premultiplied by its intensity.
    #[inline]
    pub fn emissive_radiance(&self) -> Vec3 {
        self.emissive * self.emissive_intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_material_uses_room_constants() {
        let tex = Texture::placeholder();
        let id = tex.id();
        let mat = SurfaceMaterial::standard(tex);
        assert_eq!(mat.map_id(), id);
        assert_eq!(mat.roughness, 0.4);
        assert_eq!(mat.metalness, 0.1);
        assert!((mat.emissive.x - 0.1255).abs() < 1e-3);
        assert!((mat.emissive_radiance().x - 0.0376).abs() < 1e-3);
        assert!(mat.needs_update());
    }

    #[test]
    fn set_map_marks_dirty_until_taken() {
        let mut mat = SurfaceMaterial::standard(Texture::placeholder());
        assert!(mat.take_needs_update());
        assert!(!mat.needs_update());

        let old_id = mat.map_id();
        let next = Texture::placeholder();
        let next_id = next.id();
        let previous = mat.set_map(next);
        assert_eq!(previous.id(), old_id);
        assert_eq!(mat.map_id(), next_id);
        assert!(mat.take_needs_update());
        assert!(!mat.take_needs_update());
    }
}
