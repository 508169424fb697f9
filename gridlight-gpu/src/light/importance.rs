use core::f32::consts::FRAC_PI_2;

use glam::Vec3;
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{F32Ext, Light, Vec3Ext};

/// Part of the scene covered by a single reservoir slot: an axis-aligned box
/// plus, optionally, an octant of surface normals.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct LightRegion {
    pub min: Vec3,
    pub max: Vec3,

    /// Central direction of the octant; zero if the region accepts any
    /// orientation.
    pub face: Vec3,
}

impl LightRegion {
    pub const MIN_DISTANCE_SQUARED: f32 = 1.0e-4;

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            face: Vec3::ZERO,
        }
    }

    pub fn with_face(mut self, face: Vec3) -> Self {
        self.face = face;
        self
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_diagonal(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }

    /// Returns the smallest squared distance used when estimating light
    /// falloff within this region, so that lights located inside the region
    /// don't get infinite importance.
    fn distance_floor(&self) -> f32 {
        (0.25 * self.half_diagonal().sqr()).max(Self::MIN_DISTANCE_SQUARED)
    }

    /// Returns how strongly surfaces within this region can face a light
    /// visible along given cone of directions (`axis` pointing towards the
    /// light, `spread` being the cone's half-angle).
    fn orientation_bound(&self, axis: Vec3, spread: f32) -> f32 {
        if self.face == Vec3::ZERO {
            return 1.0;
        }

        let axis = axis.safe_normalize();

        if axis == Vec3::ZERO {
            return 1.0;
        }

        let angle = Self::angle_to_octant(self.face, axis) - spread;

        if angle <= 0.0 {
            1.0
        } else if angle >= FRAC_PI_2 {
            0.0
        } else {
            angle.cos()
        }
    }

    /// Returns the angle between `dir` and the closest direction lying within
    /// the octant `face` points into.
    fn angle_to_octant(face: Vec3, dir: Vec3) -> f32 {
        let signs = Vec3::new(
            if face.x < 0.0 { -1.0 } else { 1.0 },
            if face.y < 0.0 { -1.0 } else { 1.0 },
            if face.z < 0.0 { -1.0 } else { 1.0 },
        );

        let dir = dir * signs;
        let positive = dir.max(Vec3::ZERO);

        if positive == Vec3::ZERO {
            dir.max_element().safe_acos()
        } else {
            positive.length().safe_acos()
        }
    }

    /// Returns the half-angle of a cone, originating at `origin`, that
    /// encloses a sphere of given radius placed at this region's center.
    fn angular_radius(&self, origin: Vec3, radius: f32) -> f32 {
        let distance = origin.distance(self.center());

        if distance <= radius {
            core::f32::consts::PI
        } else {
            (radius / distance).safe_asin()
        }
    }
}

impl Light {
    /// Returns a conservative estimate of this light's contribution to the
    /// given region.
    ///
    /// The estimate is zero only if the light cannot illuminate any point of
    /// the region (out of range, outside of the spot cone, behind an area
    /// light or facing away from surfaces of the region's octant); otherwise
    /// it's positive.
    ///
    /// When `centroid` is set, distances are measured from the region's
    /// center instead of its closest point, which yields sharper but less
    /// conservative estimates.
    pub fn importance(&self, region: &LightRegion, centroid: bool) -> f32 {
        let luma = self.color().luma();

        if luma <= 0.0 {
            return 0.0;
        }

        let radius = if centroid {
            0.0
        } else {
            region.half_diagonal()
        };

        if self.is_directional() {
            return luma
                * region.orientation_bound(self.directional_direction(), 0.0);
        }

        if self.is_area() {
            return self.area_importance(region, centroid, radius, luma);
        }

        let position = self.center();

        let distance_squared = if centroid {
            position.distance_squared(region.center())
        } else {
            position.distance_squared_to_box(region.min, region.max)
        };

        if distance_squared >= self.range().sqr() {
            return 0.0;
        }

        if self.is_spot() {
            let to_region = region.center() - position;
            let distance = to_region.length();

            if distance > radius {
                let angle = self
                    .spot_direction()
                    .dot(to_region / distance)
                    .safe_acos();

                let spread = (radius / distance).safe_asin();

                if angle - spread > self.spot_cos_outer().safe_acos() {
                    return 0.0;
                }
            }
        }

        let orientation = region.orientation_bound(
            position - region.center(),
            region.angular_radius(position, radius),
        );

        luma * orientation / distance_squared.max(region.distance_floor())
    }

    fn area_importance(
        &self,
        region: &LightRegion,
        centroid: bool,
        radius: f32,
        luma: f32,
    ) -> f32 {
        let cross = self.area_cross();
        let area = 0.5 * cross.length();

        if area <= 0.0 {
            return 0.0;
        }

        let [v0, v1, v2] = self.area_vertices();
        let normal = cross / (2.0 * area);

        let is_facing = if centroid {
            normal.dot(region.center() - v0) > 0.0
        } else {
            let mut is_facing = false;
            let mut corner = 0;

            while corner < 8 {
                let point = Vec3::new(
                    if corner & 1 == 0 { region.min.x } else { region.max.x },
                    if corner & 2 == 0 { region.min.y } else { region.max.y },
                    if corner & 4 == 0 { region.min.z } else { region.max.z },
                );

                if normal.dot(point - v0) > 0.0 {
                    is_facing = true;
                }

                corner += 1;
            }

            is_facing
        };

        if !is_facing {
            return 0.0;
        }

        let center = self.center();

        let light_radius = center
            .distance(v0)
            .max(center.distance(v1))
            .max(center.distance(v2));

        let distance = if centroid {
            center.distance(region.center())
        } else {
            center.distance_squared_to_box(region.min, region.max).sqrt()
        };

        let distance = (distance - light_radius).max(0.0);

        let orientation = region.orientation_bound(
            center - region.center(),
            region.angular_radius(center, radius + light_radius),
        );

        luma * area * orientation
            / distance.sqr().max(region.distance_floor())
    }
}
