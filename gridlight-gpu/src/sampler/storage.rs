use spirv_std::arch::IndexUnchecked;

use crate::{GridVariant, LightId, StreamReservoir};

/// Contents of a single reservoir slot.
///
/// In ratio-storing variants only `weight_sum / target_pdf` survives the
/// round-trip through the buffers, so slots read back from them report
/// `target_pdf = 1.0` and `weight_sum = ratio`.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GridReservoir {
    pub light_id: LightId,

    /// Build-time score of the selected light.
    pub target_pdf: f32,

    /// Sum of build-time scores of all lights streamed into this slot.
    pub weight_sum: f32,
}

impl GridReservoir {
    pub const EMPTY: Self = Self {
        light_id: LightId::NONE,
        target_pdf: 0.0,
        weight_sum: 0.0,
    };

    pub fn from_stream(stream: &StreamReservoir<LightId>) -> Self {
        if stream.is_empty() {
            Self::EMPTY
        } else {
            Self {
                light_id: stream.sample,
                target_pdf: stream.sample_weight,
                weight_sum: stream.weight_sum,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.light_id.is_none() || self.weight_sum <= 0.0
    }

    /// Returns the unbiased contribution weight of the selected light,
    /// relative to its score.
    pub fn ratio(&self) -> f32 {
        if self.target_pdf > 0.0 {
            self.weight_sum / self.target_pdf
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy)]
pub struct GridReservoirsView<'a> {
    light_ids: &'a [u32],
    light_weights: &'a [f32],
    stores_ratio: bool,
}

impl<'a> GridReservoirsView<'a> {
    pub fn new(
        light_ids: &'a [u32],
        light_weights: &'a [f32],
        variant: GridVariant,
    ) -> Self {
        Self {
            light_ids,
            light_weights,
            stores_ratio: variant.stores_ratio(),
        }
    }

    pub fn get(&self, slot: u32) -> GridReservoir {
        let light_id = LightId::new(unsafe {
            *self.light_ids.index_unchecked(slot as usize)
        });

        if light_id.is_none() {
            return GridReservoir::EMPTY;
        }

        if self.stores_ratio {
            GridReservoir {
                light_id,
                target_pdf: 1.0,
                weight_sum: unsafe {
                    *self.light_weights.index_unchecked(slot as usize)
                },
            }
        } else {
            let idx = 2 * slot as usize;

            unsafe {
                GridReservoir {
                    light_id,
                    target_pdf: *self.light_weights.index_unchecked(idx),
                    weight_sum: *self.light_weights.index_unchecked(idx + 1),
                }
            }
        }
    }
}

pub struct GridReservoirsMut<'a> {
    light_ids: &'a mut [u32],
    light_weights: &'a mut [f32],
    stores_ratio: bool,
}

impl<'a> GridReservoirsMut<'a> {
    pub fn new(
        light_ids: &'a mut [u32],
        light_weights: &'a mut [f32],
        variant: GridVariant,
    ) -> Self {
        Self {
            light_ids,
            light_weights,
            stores_ratio: variant.stores_ratio(),
        }
    }

    pub fn set(&mut self, slot: u32, reservoir: GridReservoir) {
        let reservoir = if reservoir.is_empty() {
            GridReservoir::EMPTY
        } else {
            reservoir
        };

        unsafe {
            *self.light_ids.index_unchecked_mut(slot as usize) =
                reservoir.light_id.get();

            if self.stores_ratio {
                *self.light_weights.index_unchecked_mut(slot as usize) =
                    reservoir.ratio();
            } else {
                let idx = 2 * slot as usize;

                *self.light_weights.index_unchecked_mut(idx) =
                    reservoir.target_pdf;

                *self.light_weights.index_unchecked_mut(idx + 1) =
                    reservoir.weight_sum;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MergePolicy;

    #[test]
    fn pairs() {
        let variant = GridVariant::new(MergePolicy::WithoutReplacement);
        let mut ids = vec![0; 2];
        let mut weights = vec![0.0; 4];

        let reservoir = GridReservoir {
            light_id: LightId::new(7),
            target_pdf: 2.0,
            weight_sum: 5.0,
        };

        {
            let mut out =
                GridReservoirsMut::new(&mut ids, &mut weights, variant);

            out.set(0, GridReservoir::EMPTY);
            out.set(1, reservoir);
        }

        assert_eq!(vec![u32::MAX, 7], ids);
        assert_eq!(vec![0.0, 0.0, 2.0, 5.0], weights);

        let view = GridReservoirsView::new(&ids, &weights, variant);

        assert!(view.get(0).is_empty());
        assert_eq!(reservoir, view.get(1));
    }

    #[test]
    fn ratios() {
        let variant = GridVariant::new(MergePolicy::WithReplacement);
        let mut ids = vec![0; 1];
        let mut weights = vec![0.0; 1];

        GridReservoirsMut::new(&mut ids, &mut weights, variant).set(
            0,
            GridReservoir {
                light_id: LightId::new(3),
                target_pdf: 2.0,
                weight_sum: 5.0,
            },
        );

        assert_eq!(vec![2.5], weights);

        let reservoir = GridReservoirsView::new(&ids, &weights, variant).get(0);

        assert_eq!(LightId::new(3), reservoir.light_id);
        assert_eq!(2.5, reservoir.ratio());
    }
}
