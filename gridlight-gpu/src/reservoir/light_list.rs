use crate::{LightId, Reservoir, WhiteNoise};

#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct LightListSample {
    pub light_id: LightId,
    pub target_pdf: f32,
}

/// Reservoir that combines a list of light candidates (e.g. produced by
/// `LightSamplerGrid::sample_light_list()`) into a single light used for
/// next-event estimation.
#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct LightListReservoir {
    pub reservoir: Reservoir<LightListSample>,
}

impl LightListReservoir {
    /// Adds a candidate drawn with `source_pdf` whose contribution, under the
    /// caller's target function, is `target_pdf`.
    ///
    /// Candidates with zero `source_pdf` still count towards the number of
    /// candidates, but can never be selected.
    pub fn add(
        &mut self,
        wnoise: &mut WhiteNoise,
        light_id: LightId,
        target_pdf: f32,
        source_pdf: f32,
    ) -> bool {
        let weight = if source_pdf > 0.0 {
            target_pdf / source_pdf
        } else {
            0.0
        };

        self.reservoir.update(
            wnoise,
            LightListSample {
                light_id,
                target_pdf,
            },
            weight,
        )
    }

    /// Turns the accumulated weights into the unbiased contribution weight
    /// of the selected light.
    pub fn finish(&mut self) {
        let target_pdf = self.reservoir.sample.target_pdf;

        self.reservoir.normalize(target_pdf);
    }

    pub fn light_id(&self) -> LightId {
        self.reservoir.sample.light_id
    }

    /// Returns the contribution weight; valid after [`Self::finish()`].
    pub fn weight(&self) -> f32 {
        self.reservoir.w
    }

    pub fn is_empty(&self) -> bool {
        self.reservoir.w <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::UVec2;

    use super::*;

    #[test]
    fn single_candidate() {
        let mut wnoise = WhiteNoise::new(0, UVec2::ZERO);
        let mut list = LightListReservoir::default();

        list.add(&mut wnoise, LightId::new(3), 2.0, 0.5);
        list.add(&mut wnoise, LightId::new(4), 1.0, 0.0);
        list.finish();

        assert_eq!(LightId::new(3), list.light_id());

        // (2.0 / 0.5) / (2 candidates * 2.0)
        assert_relative_eq!(1.0, list.weight());
    }
}
