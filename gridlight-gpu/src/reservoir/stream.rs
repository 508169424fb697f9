use crate::WhiteNoise;

/// Single-sample weighted reservoir that processes its input as a stream,
/// keeping exactly one item with probability proportional to its weight.
///
/// Instead of drawing a random number per item, the reservoir tracks the
/// probability that none of the items seen since the last accept would be
/// chosen (`p_none`) and compares it against a threshold drawn right after
/// each accept, so an entire stream costs one random draw per accept.
#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct StreamReservoir<T> {
    pub sample: T,

    /// Weight the currently selected sample was streamed with (for merged
    /// reservoirs: the selected sample's own target weight).
    pub sample_weight: f32,

    /// Sum of weights of all streamed items.
    pub weight_sum: f32,

    p_none: f32,
    threshold: f32,
}

impl<T> StreamReservoir<T>
where
    T: Clone + Copy,
{
    /// Streams an item whose selection weight is also its sample weight.
    pub fn update(
        &mut self,
        wnoise: &mut WhiteNoise,
        sample: T,
        weight: f32,
    ) -> bool {
        self.update_ex(wnoise, sample, weight, weight)
    }

    /// Streams an item selected with `stream_weight`, remembering
    /// `sample_weight` alongside it if it gets accepted.
    ///
    /// Items with non-positive stream weight are skipped.
    pub fn update_ex(
        &mut self,
        wnoise: &mut WhiteNoise,
        sample: T,
        sample_weight: f32,
        stream_weight: f32,
    ) -> bool {
        if stream_weight <= 0.0 {
            return false;
        }

        let prev_weight_sum = self.weight_sum;

        self.weight_sum += stream_weight;
        self.p_none *= prev_weight_sum / self.weight_sum;

        if self.threshold >= self.p_none {
            self.sample = sample;
            self.sample_weight = sample_weight;
            self.p_none = 1.0;
            self.threshold = wnoise.sample();

            true
        } else {
            false
        }
    }

    /// Merges another reservoir into this one, as if that reservoir's stream
    /// was a single item with the stream's total weight.
    pub fn merge(&mut self, wnoise: &mut WhiteNoise, rhs: &Self) -> bool {
        if rhs.is_empty() {
            return false;
        }

        self.update_ex(wnoise, rhs.sample, rhs.sample_weight, rhs.weight_sum)
    }

    pub fn is_empty(&self) -> bool {
        self.weight_sum <= 0.0
    }

    /// Returns the probability with which the selected sample was picked,
    /// relative to its sample weight.
    pub fn pdf(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.sample_weight / self.weight_sum
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec2;

    use super::*;

    /// Chi-squared critical value for 3 degrees of freedom at p = 0.0001.
    const CHI_SQUARED_3: f32 = 21.11;

    fn chi_squared(observed: &[u32], expected: &[f32], trials: u32) -> f32 {
        observed
            .iter()
            .zip(expected)
            .map(|(&observed, &expected)| {
                let expected = expected * (trials as f32);

                (observed as f32 - expected).powi(2) / expected
            })
            .sum()
    }

    #[test]
    fn selects_proportionally_to_weight() {
        let weights = [1.0, 2.0, 3.0, 4.0];
        let trials = 40_000;
        let mut hits = [0; 4];

        for trial in 0..trials {
            let mut wnoise = WhiteNoise::from_slot(0, trial);
            let mut reservoir = StreamReservoir::default();

            for (idx, &weight) in weights.iter().enumerate() {
                reservoir.update(&mut wnoise, idx, weight);
            }

            hits[reservoir.sample] += 1;
        }

        let expected = weights.map(|weight| weight / 10.0);
        let chi = chi_squared(&hits, &expected, trials);

        assert!(chi < CHI_SQUARED_3, "chi = {chi}, hits = {hits:?}");
    }

    #[test]
    fn merged_streams_select_proportionally_to_weight() {
        let weights = [1.0, 2.0, 3.0, 4.0];
        let trials = 40_000;
        let mut hits = [0; 4];

        for trial in 0..trials {
            let mut wnoise = WhiteNoise::from_slot(1, trial);
            let mut lhs = StreamReservoir::default();
            let mut rhs = StreamReservoir::default();

            lhs.update(&mut wnoise, 0, weights[0]);
            lhs.update(&mut wnoise, 3, weights[3]);
            rhs.update(&mut wnoise, 1, weights[1]);
            rhs.update(&mut wnoise, 2, weights[2]);

            let mut merged = StreamReservoir::default();

            merged.merge(&mut wnoise, &lhs);
            merged.merge(&mut wnoise, &rhs);

            assert_eq!(10.0, merged.weight_sum);
            hits[merged.sample] += 1;
        }

        let expected = weights.map(|weight| weight / 10.0);
        let chi = chi_squared(&hits, &expected, trials);

        assert!(chi < CHI_SQUARED_3, "chi = {chi}, hits = {hits:?}");
    }

    #[test]
    fn skips_non_positive_weights() {
        let mut wnoise = WhiteNoise::new(0, UVec2::ZERO);
        let mut reservoir = StreamReservoir::default();

        assert!(!reservoir.update(&mut wnoise, 1, 0.0));
        assert!(!reservoir.update(&mut wnoise, 2, -1.0));
        assert!(reservoir.is_empty());
        assert_eq!(0.0, reservoir.pdf());

        assert!(reservoir.update(&mut wnoise, 3, 2.0));
        assert_eq!(3, reservoir.sample);
        assert_eq!(1.0, reservoir.pdf());
    }

    #[test]
    fn merge_keeps_sample_weight() {
        let mut wnoise = WhiteNoise::new(0, UVec2::ZERO);
        let mut inner = StreamReservoir::default();

        inner.update_ex(&mut wnoise, 5, 2.0, 8.0);

        let mut outer = StreamReservoir::default();

        outer.merge(&mut wnoise, &inner);

        assert_eq!(5, outer.sample);
        assert_eq!(2.0, outer.sample_weight);
        assert_eq!(8.0, outer.weight_sum);
        assert_eq!(0.25, outer.pdf());
    }
}
