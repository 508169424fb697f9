use glam::{vec3, Vec3};

pub trait Vec3Ext
where
    Self: Sized,
{
    /// Returns luminance of this color-vector.
    fn luma(self) -> f32;

    /// Normalizes this vector or returns zero if it's too short to be
    /// normalized.
    fn safe_normalize(self) -> Self;

    /// Returns squared distance from this point to the closest point of given
    /// axis-aligned bounding box (zero if the point is inside of it).
    fn distance_squared_to_box(self, min: Self, max: Self) -> f32;
}

impl Vec3Ext for Vec3 {
    fn luma(self) -> f32 {
        self.dot(vec3(0.2126, 0.7152, 0.0722))
    }

    fn safe_normalize(self) -> Self {
        let len_sq = self.length_squared();

        if len_sq > 1.0e-12 {
            self / len_sq.sqrt()
        } else {
            Vec3::ZERO
        }
    }

    fn distance_squared_to_box(self, min: Self, max: Self) -> f32 {
        let d = (min - self).max(Vec3::ZERO).max(self - max);

        d.length_squared()
    }
}
