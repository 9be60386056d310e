//! Core types: math re-exports, Transform, Camera, the room scene and the
//! texture swap controller.

pub use glam::{EulerRot, Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod config;
pub mod error;
pub mod material;
pub mod scene;
pub mod swap;
pub mod transform;

pub use config::RoomConfig;
pub use error::{CoreError, CoreResult};
pub use scene::{SceneState, Surface, SurfaceKind};
pub use swap::{SwapController, SwapOutcome, SwapTicket};
