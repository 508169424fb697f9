use glam::Vec3;

use crate::gpu;

#[derive(Clone, Debug)]
pub enum Light {
    Point {
        position: Vec3,
        color: Vec3,
        range: f32,
    },

    Spot {
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        range: f32,

        /// Half-angle (in radians) of the fully-lit part of the cone.
        inner_angle: f32,

        /// Half-angle (in radians) beyond which the light doesn't reach.
        outer_angle: f32,
    },

    /// Triangular emitter, lit on the side its counter-clockwise winding
    /// faces.
    Area { vertices: [Vec3; 3], color: Vec3 },

    Directional { direction: Vec3, color: Vec3 },
}

impl Light {
    pub(crate) fn serialize(&self) -> gpu::Light {
        match *self {
            Light::Point {
                position,
                color,
                range,
            } => gpu::Light::point(position, color, range),

            Light::Spot {
                position,
                direction,
                color,
                range,
                inner_angle,
                outer_angle,
            } => gpu::Light::spot(
                position,
                direction,
                color,
                range,
                inner_angle,
                outer_angle,
            ),

            Light::Area {
                vertices: [v0, v1, v2],
                color,
            } => gpu::Light::area(v0, v1, v2, color),

            Light::Directional { direction, color } => {
                gpu::Light::directional(direction, color)
            }
        }
    }
}
