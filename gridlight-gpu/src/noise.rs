use core::f32::consts::PI;

use glam::{vec2, vec3, UVec2, Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// PCG-based white-noise generator.
///
/// Each invocation owns its own generator, seeded from invocation-specific
/// data (e.g. slot index and frame), so that the results are reproducible for
/// a given `(seed, id)` pair.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct WhiteNoise {
    state: u32,
}

impl WhiteNoise {
    pub fn new(seed: u32, id: UVec2) -> Self {
        let mut this = Self {
            state: seed
                ^ id.x.wrapping_mul(48619)
                ^ id.y.wrapping_mul(95461),
        };

        // Decorrelate neighbouring ids, whose initial states differ by just a
        // couple of bits
        this.sample_int();
        this
    }

    /// Creates a generator for given reservoir slot at given frame.
    pub fn from_slot(slot: u32, frame: u32) -> Self {
        Self::new(frame.wrapping_mul(0x9e3779b9), UVec2::new(slot, frame))
    }

    /// Derives an independent generator for given stream (e.g. lane within a
    /// workgroup) out of this one.
    pub fn with_stream(mut self, stream: u32) -> Self {
        self.state ^= Self::hash(stream.wrapping_add(0x632be59b));
        self.sample_int();
        self
    }

    /// Generates a uniform sample in range `<0.0, 1.0)`.
    pub fn sample(&mut self) -> f32 {
        ((self.sample_int() >> 8) as f32) * (1.0 / 16_777_216.0)
    }

    /// Generates a uniform sample in range `<0, u32::MAX>`.
    pub fn sample_int(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(747796405)
            .wrapping_add(2891336453);

        Self::permute(self.state)
    }

    /// Generates a uniform sample in range `<0.0, 1.0)^3`.
    pub fn sample_vec3(&mut self) -> Vec3 {
        let x = self.sample();
        let y = self.sample();
        let z = self.sample();

        vec3(x, y, z)
    }

    /// Generates a uniform sample inside of a unit disk.
    pub fn sample_disk(&mut self) -> Vec2 {
        let radius = self.sample().sqrt();
        let angle = self.sample() * PI * 2.0;

        vec2(angle.cos(), angle.sin()) * radius
    }

    /// Picks a uniform index in range `<0, count)`; `count` must be positive.
    pub fn sample_index(&mut self, count: u32) -> u32 {
        ((self.sample() * (count as f32)) as u32).min(count - 1)
    }

    fn hash(value: u32) -> u32 {
        Self::permute(value.wrapping_mul(747796405).wrapping_add(2891336453))
    }

    fn permute(state: u32) -> u32 {
        let word = ((state >> ((state >> 28) + 4)) ^ state)
            .wrapping_mul(277803737);

        (word >> 22) ^ word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproducible() {
        let mut a = WhiteNoise::from_slot(12, 34);
        let mut b = WhiteNoise::from_slot(12, 34);

        for _ in 0..16 {
            assert_eq!(a.sample_int(), b.sample_int());
        }
    }

    #[test]
    fn streams_are_distinct() {
        let base = WhiteNoise::from_slot(5, 1);
        let mut a = base.with_stream(0);
        let mut b = base.with_stream(1);

        let same = (0..16).filter(|_| a.sample_int() == b.sample_int()).count();

        assert!(same < 2);
    }

    #[test]
    fn sample_range() {
        let mut noise = WhiteNoise::new(0, UVec2::ZERO);
        let mut sum = 0.0;

        for _ in 0..10_000 {
            let x = noise.sample();

            assert!((0.0..1.0).contains(&x));
            sum += x;
        }

        let mean = sum / 10_000.0;

        assert!((mean - 0.5).abs() < 0.02, "mean = {mean}");
    }

    #[test]
    fn sample_index() {
        let mut noise = WhiteNoise::new(1, UVec2::ONE);
        let mut hits = [0; 4];

        for _ in 0..4_000 {
            hits[noise.sample_index(4) as usize] += 1;
        }

        for hit in hits {
            assert!(hit > 800, "hits = {hits:?}");
        }
    }
}
