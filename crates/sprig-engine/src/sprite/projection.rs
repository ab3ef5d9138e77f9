use glam::{Mat4, Vec4};

use crate::coords::Viewport;
use crate::device::NdcYAxis;

/// Orthographic projection from pixel space (origin top-left, +Y down) into
/// the device's clip volume. Depth maps z to -z; sprites sit at z = 0.
pub fn ortho_projection(viewport: Viewport, y_axis: NdcYAxis) -> Mat4 {
    debug_assert!(viewport.is_valid(), "projection needs a non-empty viewport");

    let (sy, ty) = match y_axis {
        NdcYAxis::Down => (2.0 / viewport.height, -1.0),
        NdcYAxis::Up => (-2.0 / viewport.height, 1.0),
    };

    Mat4::from_cols(
        Vec4::new(2.0 / viewport.width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, sy, 0.0, 0.0),
        Vec4::new(0.0, 0.0, -1.0, 0.0),
        Vec4::new(-1.0, ty, 0.0, 1.0),
    )
}
