//! The room: three fixed planes, a camera and two lights.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use asset::Texture;
use asset::mesh::MeshData;

use crate::camera::Camera;
use crate::error::CoreError;
use crate::material::SurfaceMaterial;
use crate::transform::Transform;
use crate::{Vec3, vec3};

/// One of the three planes of the room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Floor,
    FrontWall,
    LeftWall,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 3] = [Self::Floor, Self::FrontWall, Self::LeftWall];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Floor => 0,
            Self::FrontWall => 1,
            Self::LeftWall => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Floor => "Floor",
            Self::FrontWall => "Front wall",
            Self::LeftWall => "Left wall",
        }
    }

    /// Name used on the command line.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::FrontWall => "front-wall",
            Self::LeftWall => "left-wall",
        }
    }

    /// (width, height) of the plane in world units.
    pub const fn size(self) -> (f32, f32) {
        match self {
            Self::Floor => (5.0, 5.0),
            Self::FrontWall => (5.0, 8.0),
            Self::LeftWall => (2.5, 5.0),
        }
    }

    /// Fixed placement of the plane in the room.
    pub fn transform(self) -> Transform {
        match self {
            Self::Floor => Transform::placed(Vec3::ZERO, vec3(-PI / 2.0, 0.0, 0.0)),
            Self::FrontWall => Transform::placed(vec3(0.0, 1.5, -2.5), Vec3::ZERO),
            // Slightly past 90° and pulled forward so it does not z-fight the front wall.
            Self::LeftWall => Transform::placed(vec3(-2.2, 2.5, -0.01), vec3(0.0, PI / 2.1, 0.0)),
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SurfaceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "floor" => Ok(Self::Floor),
            "front-wall" | "front" | "wall1" => Ok(Self::FrontWall),
            "left-wall" | "left" | "wall2" => Ok(Self::LeftWall),
            _ => Err(CoreError::UnknownSurface(s.to_string())),
        }
    }
}

/// A textured plane with fixed geometry and placement.
#[derive(Clone, Debug)]
pub struct Surface {
    kind: SurfaceKind,
    width: f32,
    height: f32,
    transform: Transform,
    pub material: SurfaceMaterial,
}

impl Surface {
    pub fn new(kind: SurfaceKind, map: Texture) -> Self {
        let (width, height) = kind.size();
        Self {
            kind,
            width,
            height,
            transform: kind.transform(),
            material: SurfaceMaterial::standard(map),
        }
    }

    #[inline]
    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    #[inline]
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn texture(&self) -> &Texture {
        self.material.map()
    }

    pub fn mesh(&self) -> MeshData {
        MeshData::plane(self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl DirectionalLight {
    /// Unit vector the light travels along.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: 1.0,
            },
            directional: DirectionalLight {
                color: Vec3::ONE,
                intensity: 1.0,
                position: vec3(5.0, 5.0, 5.0),
                target: Vec3::ZERO,
            },
        }
    }
}

/// Everything the renderer draws. Exactly three surfaces, one texture each.
#[derive(Clone, Debug)]
pub struct SceneState {
    surfaces: [Surface; 3],
    pub camera: Camera,
    pub lights: Lights,
    viewport: (u32, u32),
}

impl SceneState {
    /// Build the room with every surface showing a placeholder texture.
    pub fn new(width: u32, height: u32) -> Self {
        let surfaces = SurfaceKind::ALL.map(|kind| Surface::new(kind, Texture::placeholder()));
        let mut camera = Camera::room_view(1.0);
        camera.set_viewport(width, height);
        Self {
            surfaces,
            camera,
            lights: Lights::default(),
            viewport: (width.max(1), height.max(1)),
        }
    }

    #[inline]
    pub fn surface(&self, kind: SurfaceKind) -> &Surface {
        &self.surfaces[kind.index()]
    }

    #[inline]
    pub fn surface_mut(&mut self, kind: SurfaceKind) -> &mut Surface {
        &mut self.surfaces[kind.index()]
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter()
    }

    pub fn surfaces_mut(&mut self) -> impl Iterator<Item = &mut Surface> {
        self.surfaces.iter_mut()
    }

    /// Replace the texture of one surface; returns the previous one.
    pub fn bind_texture(&mut self, kind: SurfaceKind, texture: Texture) -> Texture {
        self.surface_mut(kind).material.set_map(texture)
    }

    #[inline]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// React to a viewport change: camera aspect and cached size only.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
        self.camera.set_viewport(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_has_three_fixed_surfaces() {
        let scene = SceneState::new(1280, 720);
        let kinds: Vec<_> = scene.surfaces().map(Surface::kind).collect();
        assert_eq!(kinds, SurfaceKind::ALL.to_vec());

        assert_eq!(scene.surface(SurfaceKind::Floor).size(), (5.0, 5.0));
        assert_eq!(scene.surface(SurfaceKind::FrontWall).size(), (5.0, 8.0));
        assert_eq!(scene.surface(SurfaceKind::LeftWall).size(), (2.5, 5.0));

        let wall = scene.surface(SurfaceKind::FrontWall).transform();
        assert_eq!(wall.translation, vec3(0.0, 1.5, -2.5));
    }

    #[test]
    fn floor_faces_up_and_left_wall_faces_into_room() {
        let scene = SceneState::new(800, 600);
        let up = scene.surface(SurfaceKind::Floor).transform().facing();
        assert!((up - Vec3::Y).length() < 1e-5);

        let left = scene.surface(SurfaceKind::LeftWall).transform().facing();
        assert!(left.x > 0.99);
    }

    #[test]
    fn placeholders_are_distinct_textures() {
        let scene = SceneState::new(800, 600);
        let ids: Vec<_> = scene.surfaces().map(|s| s.texture().id()).collect();
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
    }

    #[test]
    fn resize_touches_only_camera_and_viewport() {
        let mut scene = SceneState::new(800, 600);
        let before: Vec<_> = scene
            .surfaces()
            .map(|s| (s.texture().id(), s.size(), *s.transform()))
            .collect();

        scene.resize(1920, 1080);
        assert_eq!(scene.viewport(), (1920, 1080));
        assert!((scene.camera.aspect - 16.0 / 9.0).abs() < 1e-6);

        let after: Vec<_> = scene
            .surfaces()
            .map(|s| (s.texture().id(), s.size(), *s.transform()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn minimized_window_clamps_to_one_pixel() {
        let mut scene = SceneState::new(800, 600);
        scene.resize(0, 0);
        assert_eq!(scene.viewport(), (1, 1));
        assert_eq!(scene.camera.aspect, 1.0);
    }

    #[test]
    fn surface_names_parse() {
        assert_eq!("floor".parse::<SurfaceKind>().unwrap(), SurfaceKind::Floor);
        assert_eq!("wall1".parse::<SurfaceKind>().unwrap(), SurfaceKind::FrontWall);
        assert_eq!("Left-Wall".parse::<SurfaceKind>().unwrap(), SurfaceKind::LeftWall);
        assert!("ceiling".parse::<SurfaceKind>().is_err());
    }
}
