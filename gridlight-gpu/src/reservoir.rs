mod light_list;
mod stream;

pub use self::light_list::*;
pub use self::stream::*;
use crate::WhiteNoise;

/// Classic resampled-importance-sampling reservoir, where `w` accumulates
/// candidate weights until [`Self::normalize()`] turns it into the
/// unbiased contribution weight of the selected sample.
#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Reservoir<T> {
    pub sample: T,
    pub m: f32,
    pub w: f32,
}

impl<T> Reservoir<T>
where
    T: Clone + Copy,
{
    pub fn update(
        &mut self,
        wnoise: &mut WhiteNoise,
        sample: T,
        weight: f32,
    ) -> bool {
        self.m += 1.0;
        self.w += weight;

        if weight > 0.0 && wnoise.sample() * self.w <= weight {
            self.sample = sample;
            true
        } else {
            false
        }
    }

    pub fn normalize(&mut self, pdf: f32) {
        let t = self.m * pdf;

        self.w = if t == 0.0 { 0.0 } else { self.w / t };
    }
}
