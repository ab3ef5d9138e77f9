//! 2D spatial transform: position, rotation about +Z, scale.

use std::cell::Cell;
use std::rc::Rc;

use glam::{Mat4, Quat, Vec2, Vec3};

/// Transform shared between gameplay code (writer) and a sprite graphic
/// (reader at draw time).
pub type SharedTransform = Rc<Cell<Transform2D>>;

/// 2D transform in pixel space.
///
/// Rotation is in radians; with +Y pointing down a positive angle turns
/// clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
    };

    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Wraps the transform for sharing with a sprite graphic.
    pub fn shared(self) -> SharedTransform {
        Rc::new(Cell::new(self))
    }

    /// Model matrix `T * R * S`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.extend(1.0),
            Quat::from_rotation_z(self.rotation),
            Vec3::new(self.position.x, self.position.y, 0.0),
        )
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
    }

    pub fn rotate(&mut self, angle: f32) {
        self.rotation += angle;
    }
}
