use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{smoothstep, F32Ext, Vec3Ext};

mod importance;

pub use self::importance::*;

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct Light {
    /// x - position x (for area lights: first vertex x)
    /// y - position y (for area lights: first vertex y)
    /// z - position z (for area lights: first vertex z)
    /// w - range (ignored for area and directional lights)
    pub d0: Vec4,

    /// x - color r
    /// y - color g
    /// z - color b
    /// w - (as u32) light type, see `Self::TYPE_*`
    pub d1: Vec4,

    /// For spot lights: xyz - direction, w - cosine of the outer angle
    /// For area lights: xyz - second vertex
    /// For directional lights: xyz - direction towards the light
    pub d2: Vec4,

    /// For spot lights: x - cosine of the inner angle
    /// For area lights: xyz - third vertex
    pub d3: Vec4,
}

impl Light {
    pub const TYPE_POINT: u32 = 0;
    pub const TYPE_SPOT: u32 = 1;
    pub const TYPE_AREA: u32 = 2;
    pub const TYPE_DIRECTIONAL: u32 = 3;

    pub fn point(position: Vec3, color: Vec3, range: f32) -> Self {
        Self {
            d0: position.extend(range),
            d1: color.extend(f32::from_bits(Self::TYPE_POINT)),
            d2: Vec4::ZERO,
            d3: Vec4::ZERO,
        }
    }

    /// Creates a spot light; angles are half-angles of the cone, in radians.
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        range: f32,
        inner_angle: f32,
        outer_angle: f32,
    ) -> Self {
        let outer_angle = outer_angle.clamp(0.0, core::f32::consts::PI);
        let inner_angle = inner_angle.clamp(0.0, outer_angle);

        Self {
            d0: position.extend(range),
            d1: color.extend(f32::from_bits(Self::TYPE_SPOT)),
            d2: direction.safe_normalize().extend(outer_angle.cos()),
            d3: Vec4::new(inner_angle.cos(), 0.0, 0.0, 0.0),
        }
    }

    /// Creates a one-sided triangular emitter, emitting towards the side its
    /// counter-clockwise winding faces.
    pub fn area(v0: Vec3, v1: Vec3, v2: Vec3, color: Vec3) -> Self {
        Self {
            d0: v0.extend(0.0),
            d1: color.extend(f32::from_bits(Self::TYPE_AREA)),
            d2: v1.extend(0.0),
            d3: v2.extend(0.0),
        }
    }

    /// Creates a light infinitely far away, shining from `direction`.
    pub fn directional(direction: Vec3, color: Vec3) -> Self {
        Self {
            d0: Vec4::ZERO,
            d1: color.extend(f32::from_bits(Self::TYPE_DIRECTIONAL)),
            d2: direction.safe_normalize().extend(0.0),
            d3: Vec4::ZERO,
        }
    }

    pub fn ty(&self) -> u32 {
        self.d1.w.to_bits()
    }

    pub fn is_point(&self) -> bool {
        self.ty() == Self::TYPE_POINT
    }

    pub fn is_spot(&self) -> bool {
        self.ty() == Self::TYPE_SPOT
    }

    pub fn is_area(&self) -> bool {
        self.ty() == Self::TYPE_AREA
    }

    pub fn is_directional(&self) -> bool {
        self.ty() == Self::TYPE_DIRECTIONAL
    }

    pub fn color(&self) -> Vec3 {
        self.d1.xyz()
    }

    pub fn range(&self) -> f32 {
        self.d0.w
    }

    /// Returns position of the light; for area lights that's their centroid.
    pub fn center(&self) -> Vec3 {
        if self.is_area() {
            (self.d0.xyz() + self.d2.xyz() + self.d3.xyz()) / 3.0
        } else {
            self.d0.xyz()
        }
    }

    pub fn spot_direction(&self) -> Vec3 {
        self.d2.xyz()
    }

    pub fn spot_cos_outer(&self) -> f32 {
        self.d2.w
    }

    pub fn spot_cos_inner(&self) -> f32 {
        self.d3.x
    }

    pub fn directional_direction(&self) -> Vec3 {
        self.d2.xyz()
    }

    pub fn area_vertices(&self) -> [Vec3; 3] {
        [self.d0.xyz(), self.d2.xyz(), self.d3.xyz()]
    }

    /// Returns the unnormalized normal of an area light; its length is twice
    /// the triangle's area.
    pub fn area_cross(&self) -> Vec3 {
        let [v0, v1, v2] = self.area_vertices();

        (v1 - v0).cross(v2 - v0)
    }

    /// Returns luminance of the unshadowed irradiance this light delivers at
    /// given point.
    ///
    /// `normal` can be zero, in which case the surface orientation is not
    /// taken into account (e.g. for volumes).
    pub fn irradiance(&self, position: Vec3, normal: Vec3) -> f32 {
        let luma = self.color().luma();

        if luma <= 0.0 {
            return 0.0;
        }

        if self.is_directional() {
            return luma * Self::cosine(normal, self.directional_direction());
        }

        if self.is_area() {
            let cross = self.area_cross();
            let area = 0.5 * cross.length();

            if area <= 0.0 {
                return 0.0;
            }

            let to_light = self.center() - position;
            let distance_squared = to_light.length_squared().max(1.0e-4);
            let l = to_light / distance_squared.sqrt();
            let cos_light = (-l).dot(cross / (2.0 * area)).max(0.0);

            return luma * area * cos_light * Self::cosine(normal, l)
                / distance_squared.max(area);
        }

        let to_light = self.center() - position;
        let distance_squared = to_light.length_squared();

        let attenuation = Self::distance_attenuation(
            distance_squared,
            1.0 / self.range().max(1.0e-4).sqr(),
        );

        if attenuation <= 0.0 {
            return 0.0;
        }

        let l = to_light.safe_normalize();

        let cone_factor = if self.is_spot() {
            smoothstep(
                self.spot_cos_outer(),
                self.spot_cos_inner(),
                self.spot_direction().dot(-l),
            )
        } else {
            1.0
        };

        luma * attenuation * cone_factor * Self::cosine(normal, l)
    }

    fn distance_attenuation(
        distance_squared: f32,
        inverse_range_squared: f32,
    ) -> f32 {
        let factor = distance_squared * inverse_range_squared;
        let smooth_factor = (1.0 - factor * factor).saturate();

        smooth_factor * smooth_factor / distance_squared.max(1.0e-4)
    }

    fn cosine(normal: Vec3, l: Vec3) -> f32 {
        if normal == Vec3::ZERO {
            1.0
        } else {
            normal.dot(l).saturate()
        }
    }
}

/// Index into the lights buffer.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, Hash))]
pub struct LightId(u32);

impl LightId {
    /// Marker stored inside reservoir slots that didn't pick any light.
    pub const NONE: Self = Self(u32::MAX);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_some(self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(self) -> bool {
        !self.is_some()
    }
}
