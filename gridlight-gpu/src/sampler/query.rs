use glam::Vec3;

use crate::{
    GridConfig, GridReservoirsView, GridVariant, Light, LightId,
    LightListReservoir, LightsView, MergePolicy, OctahedralFace,
    StreamReservoir, WhiteNoise,
};

/// Function the with-replacement merge (and the light-list queries) weight
/// lights with; usually an estimate of the light's unshadowed contribution
/// to the shaded point.
pub trait TargetPdf {
    fn eval(&self, light: Light, position: Vec3, normal: Vec3) -> f32;
}

/// Target function that ignores materials, weighting lights by the
/// irradiance they deliver.
#[derive(Clone, Copy, Default)]
pub struct IrradianceTarget;

impl TargetPdf for IrradianceTarget {
    fn eval(&self, light: Light, position: Vec3, normal: Vec3) -> f32 {
        light.irradiance(position, normal)
    }
}

#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct LightSample {
    pub light_id: LightId,

    /// Probability (density) of having selected this light; zero if no light
    /// got selected.
    pub pdf: f32,
}

impl LightSample {
    pub const NONE: Self = Self {
        light_id: LightId::new(0),
        pdf: 0.0,
    };

    pub fn is_some(&self) -> bool {
        self.pdf > 0.0
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }
}

/// Cone of positions for which [`LightSamplerGrid::sample_light_list_cone()`]
/// gathers lights, e.g. a glossy lobe or a pixel's footprint.
#[derive(Clone, Copy)]
pub struct LightCone {
    pub origin: Vec3,

    /// Normalized direction of the cone's axis.
    pub direction: Vec3,

    /// Tangent of the cone's half-angle.
    pub spread: f32,

    pub length: f32,
}

/// Read-only view of the grid, used by shaders that want to pick lights.
#[derive(Clone, Copy)]
pub struct LightSamplerGrid<'a> {
    config: GridConfig,
    reservoirs: GridReservoirsView<'a>,
    lights: LightsView<'a>,
    variant: GridVariant,
}

impl<'a> LightSamplerGrid<'a> {
    const NO_SLOT: u32 = u32::MAX;

    pub fn new(
        config: GridConfig,
        light_ids: &'a [u32],
        light_weights: &'a [f32],
        lights: LightsView<'a>,
        variant: GridVariant,
    ) -> Self {
        Self {
            config,
            reservoirs: GridReservoirsView::new(
                light_ids,
                light_weights,
                variant,
            ),
            lights,
            variant,
        }
    }

    /// Returns the first slot of the (jittered) cell and face responsible for
    /// given point, or [`Self::NO_SLOT`] if there's nothing to sample.
    ///
    /// Points outside of the grid get no slot, but points whose jittered
    /// position falls outside of it get clamped to the closest cell.
    fn locate(
        &self,
        wnoise: &mut WhiteNoise,
        position: Vec3,
        normal: Vec3,
    ) -> u32 {
        if self.lights.is_empty() || !self.config.is_valid() {
            return Self::NO_SLOT;
        }

        if self.config.cell_at(position).is_none() {
            return Self::NO_SLOT;
        }

        let jitter = (wnoise.sample_vec3() - 0.5) * self.config.cell_size();
        let cell = self.config.cell_at_clamped(position + jitter);

        if self.variant.is_octahedral() {
            self.config.first_slot(
                cell,
                OctahedralFace::COUNT,
                OctahedralFace::from_normal(normal).get(),
            )
        } else {
            self.config.first_slot(cell, 1, 0)
        }
    }

    /// Picks a light for given point, according to the grid's merge policy.
    pub fn sample_lights(
        &self,
        wnoise: &mut WhiteNoise,
        position: Vec3,
        normal: Vec3,
        target: &impl TargetPdf,
    ) -> LightSample {
        let first_slot = self.locate(wnoise, position, normal);

        if first_slot == Self::NO_SLOT {
            return LightSample::NONE;
        }

        self.sample_slots(
            wnoise,
            first_slot,
            0,
            self.config.reservoirs_per_cell(),
            position,
            normal,
            target,
        )
    }

    /// Returns the probability with which [`Self::sample_lights()`] would
    /// pick given light for given point; zero if the light couldn't be picked
    /// at all.
    ///
    /// `wnoise` must be in the same state as the one passed to
    /// `sample_lights()`, so that both queries land in the same cell.
    pub fn sample_light_pdf(
        &self,
        wnoise: &mut WhiteNoise,
        light_id: LightId,
        position: Vec3,
        normal: Vec3,
        target: &impl TargetPdf,
    ) -> f32 {
        let first_slot = self.locate(wnoise, position, normal);

        if first_slot == Self::NO_SLOT {
            return 0.0;
        }

        self.slots_pdf(
            first_slot,
            0,
            self.config.reservoirs_per_cell(),
            light_id,
            position,
            normal,
            target,
        )
    }

    /// Picks `N` lights for given point and feeds them into `out`.
    ///
    /// With `fast_merge`, the cell's reservoirs are split into `N` disjoint
    /// segments, each one merged into a single candidate (so every candidate
    /// comes from a different part of the light list); otherwise all `N`
    /// candidates are drawn independently from all of the reservoirs.
    #[allow(clippy::too_many_arguments)]
    pub fn sample_light_list<const N: usize>(
        &self,
        wnoise: &mut WhiteNoise,
        position: Vec3,
        normal: Vec3,
        target: &impl TargetPdf,
        fast_merge: bool,
        out: &mut LightListReservoir,
    ) {
        let first_slot = self.locate(wnoise, position, normal);

        if first_slot == Self::NO_SLOT {
            return;
        }

        let reservoirs = self.config.reservoirs_per_cell();

        if !fast_merge {
            let mut i = 0;

            while i < N {
                let sample = self.sample_slots(
                    wnoise, first_slot, 0, reservoirs, position, normal, target,
                );

                self.add_candidate(
                    wnoise, out, sample, 1.0, position, normal, target,
                );
                i += 1;
            }

            return;
        }

        let mut samples = [LightSample::NONE; N];
        let mut non_empty = 0;
        let mut i = 0;

        while i < N {
            let begin = (i as u32) * reservoirs / (N as u32);
            let end = (i as u32 + 1) * reservoirs / (N as u32);

            samples[i] = self.sample_slots(
                wnoise, first_slot, begin, end, position, normal, target,
            );

            if samples[i].is_some() {
                non_empty += 1;
            }

            i += 1;
        }

        // Each segment covers a disjoint subset of the lights, so a segment's
        // pdf has to be spread across the segments that could've produced a
        // candidate
        let mut i = 0;

        while i < N {
            if samples[i].is_some() {
                self.add_candidate(
                    wnoise,
                    out,
                    samples[i],
                    non_empty as f32,
                    position,
                    normal,
                    target,
                );
            }

            i += 1;
        }
    }

    /// Like [`Self::sample_light_list()`], but picks each candidate from a
    /// different point within given cone, so that lights relevant to the
    /// entire cone get considered.
    ///
    /// Candidates are weighted by the target function evaluated at the
    /// cone's origin, while their pdfs are the ones of the cells they were
    /// picked from, so the result is an approximation that gets more precise
    /// the narrower the cone is.
    pub fn sample_light_list_cone<const N: usize>(
        &self,
        wnoise: &mut WhiteNoise,
        cone: LightCone,
        normal: Vec3,
        target: &impl TargetPdf,
        out: &mut LightListReservoir,
    ) {
        let (tangent, bitangent) = cone.direction.any_orthonormal_pair();
        let reservoirs = self.config.reservoirs_per_cell();
        let mut i = 0;

        while i < N {
            let t = ((i as f32) + wnoise.sample()) / (N as f32) * cone.length;
            let disk = wnoise.sample_disk() * (t * cone.spread);

            let position = cone.origin
                + cone.direction * t
                + tangent * disk.x
                + bitangent * disk.y;

            let first_slot = self.locate(wnoise, position, normal);

            let sample = if first_slot == Self::NO_SLOT {
                LightSample::NONE
            } else {
                self.sample_slots(
                    wnoise, first_slot, 0, reservoirs, position, normal, target,
                )
            };

            self.add_candidate(
                wnoise,
                out,
                sample,
                1.0,
                cone.origin,
                normal,
                target,
            );

            i += 1;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn add_candidate(
        &self,
        wnoise: &mut WhiteNoise,
        out: &mut LightListReservoir,
        sample: LightSample,
        pdf_scale: f32,
        position: Vec3,
        normal: Vec3,
        target: &impl TargetPdf,
    ) {
        let target_pdf = if sample.is_some() {
            target.eval(self.lights.get(sample.light_id), position, normal)
        } else {
            0.0
        };

        out.add(wnoise, sample.light_id, target_pdf, sample.pdf / pdf_scale);
    }

    /// Merges reservoirs `begin..end` of the cell starting at `first_slot`
    /// into a single light.
    #[allow(clippy::too_many_arguments)]
    fn sample_slots(
        &self,
        wnoise: &mut WhiteNoise,
        first_slot: u32,
        begin: u32,
        end: u32,
        position: Vec3,
        normal: Vec3,
        target: &impl TargetPdf,
    ) -> LightSample {
        if begin >= end {
            return LightSample::NONE;
        }

        match self.variant.merge_policy() {
            MergePolicy::RandomSelect => {
                let count = end - begin;
                let slot = first_slot + begin + wnoise.sample_index(count);
                let reservoir = self.reservoirs.get(slot);

                if reservoir.is_empty() || reservoir.target_pdf <= 0.0 {
                    return LightSample::NONE;
                }

                LightSample {
                    light_id: reservoir.light_id,
                    pdf: reservoir.target_pdf
                        / (reservoir.weight_sum * (count as f32)),
                }
            }

            policy => {
                let mut merged = StreamReservoir::<LightId>::default();
                let mut slot = first_slot + begin;

                while slot < first_slot + end {
                    let reservoir = self.reservoirs.get(slot);

                    if !reservoir.is_empty() {
                        if policy == MergePolicy::WithReplacement {
                            let light = self.lights.get(reservoir.light_id);
                            let target_pdf =
                                target.eval(light, position, normal);

                            merged.update_ex(
                                wnoise,
                                reservoir.light_id,
                                target_pdf,
                                target_pdf * reservoir.ratio(),
                            );
                        } else {
                            merged.update_ex(
                                wnoise,
                                reservoir.light_id,
                                reservoir.target_pdf,
                                reservoir.weight_sum,
                            );
                        }
                    }

                    slot += 1;
                }

                if merged.is_empty() || merged.sample_weight <= 0.0 {
                    return LightSample::NONE;
                }

                LightSample {
                    light_id: merged.sample,
                    pdf: merged.pdf(),
                }
            }
        }
    }

    /// Counterpart of [`Self::sample_slots()`] that computes the probability
    /// of picking given light instead of picking one.
    #[allow(clippy::too_many_arguments)]
    fn slots_pdf(
        &self,
        first_slot: u32,
        begin: u32,
        end: u32,
        light_id: LightId,
        position: Vec3,
        normal: Vec3,
        target: &impl TargetPdf,
    ) -> f32 {
        if begin >= end {
            return 0.0;
        }

        let policy = self.variant.merge_policy();
        let count = end - begin;
        let mut weight_sum = 0.0;
        let mut pdf = 0.0;
        let mut slot = first_slot + begin;

        while slot < first_slot + end {
            let reservoir = self.reservoirs.get(slot);

            if !reservoir.is_empty() {
                let is_match = reservoir.light_id == light_id;

                match policy {
                    MergePolicy::RandomSelect => {
                        if is_match {
                            pdf += reservoir.target_pdf
                                / (reservoir.weight_sum * (count as f32));
                        }
                    }

                    MergePolicy::WithoutReplacement => {
                        weight_sum += reservoir.weight_sum;

                        if is_match {
                            pdf += reservoir.target_pdf;
                        }
                    }

                    MergePolicy::WithReplacement => {
                        let light = self.lights.get(reservoir.light_id);
                        let target_pdf = target.eval(light, position, normal);

                        weight_sum += target_pdf * reservoir.ratio();

                        if is_match {
                            pdf += target_pdf;
                        }
                    }
                }
            }

            slot += 1;
        }

        if policy == MergePolicy::RandomSelect {
            pdf
        } else if weight_sum > 0.0 {
            pdf / weight_sum
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, UVec2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::{GridBuilder, GridReservoirsMut, Vec3Ext};

    /// Target that weights lights by their brightness alone, so that the
    /// expected contribution of a light list is known up-front.
    struct LumaTarget;

    impl TargetPdf for LumaTarget {
        fn eval(&self, light: Light, _: Vec3, _: Vec3) -> f32 {
            light.color().luma()
        }
    }

    struct TestGrid {
        config: GridConfig,
        lights: Vec<Light>,
        light_ids: Vec<u32>,
        light_weights: Vec<f32>,
        variant: GridVariant,
    }

    impl TestGrid {
        fn build(
            config: GridConfig,
            lights: Vec<Light>,
            variant: GridVariant,
        ) -> Self {
            Self::build_frame(config, lights, variant, 0)
        }

        fn build_frame(
            config: GridConfig,
            lights: Vec<Light>,
            variant: GridVariant,
            frame: u32,
        ) -> Self {
            let slots = config.slot_count(variant.faces());
            let mut light_ids = vec![0; slots as usize];

            let mut light_weights =
                vec![0.0; (slots * variant.weights_stride()) as usize];

            {
                let builder = GridBuilder::new(
                    config,
                    LightsView::new(&lights, lights.len() as u32),
                    variant,
                    frame,
                );

                let mut out = GridReservoirsMut::new(
                    &mut light_ids,
                    &mut light_weights,
                    variant,
                );

                for item in 0..slots {
                    builder.run_serial(item, &mut out);
                }
            }

            Self {
                config,
                lights,
                light_ids,
                light_weights,
                variant,
            }
        }

        fn grid(&self) -> LightSamplerGrid<'_> {
            LightSamplerGrid::new(
                self.config,
                &self.light_ids,
                &self.light_weights,
                LightsView::new(&self.lights, self.lights.len() as u32),
                self.variant,
            )
        }
    }

    fn policies() -> [MergePolicy; 3] {
        [
            MergePolicy::RandomSelect,
            MergePolicy::WithoutReplacement,
            MergePolicy::WithReplacement,
        ]
    }

    fn random_lights(count: usize, seed: u64) -> Vec<Light> {
        let mut rng = StdRng::seed_from_u64(seed);

        (0..count)
            .map(|idx| {
                let position = vec3(
                    rng.gen_range(0.0..8.0),
                    rng.gen_range(0.0..8.0),
                    rng.gen_range(0.0..8.0),
                );

                let color = Vec3::splat(rng.gen_range(0.1..2.0));

                if idx % 5 == 0 {
                    Light::spot(
                        position,
                        vec3(0.0, -1.0, 0.0),
                        color,
                        50.0,
                        0.5,
                        0.9,
                    )
                } else {
                    Light::point(position, color, 50.0)
                }
            })
            .collect()
    }

    fn point_lights(count: usize, seed: u64) -> Vec<Light> {
        random_lights(count, seed)
            .into_iter()
            .map(|light| Light::point(light.center(), light.color(), 50.0))
            .collect()
    }

    fn total_luma(lights: &[Light]) -> f32 {
        lights.iter().map(|light| light.color().luma()).sum()
    }

    #[test]
    fn single_light() {
        for policy in policies() {
            let grid = TestGrid::build(
                GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(2.0), 2, 1),
                vec![Light::point(Vec3::ONE, Vec3::ONE, 100.0)],
                GridVariant::new(policy),
            );

            let mut wnoise = WhiteNoise::new(0, UVec2::ZERO);

            let sample = grid.grid().sample_lights(
                &mut wnoise,
                vec3(1.5, 1.5, 1.5),
                Vec3::ZERO,
                &IrradianceTarget,
            );

            assert_eq!(LightId::new(0), sample.light_id, "policy = {policy:?}");
            assert_relative_eq!(1.0, sample.pdf, epsilon = 1.0e-5);
        }
    }

    #[test]
    fn no_lights() {
        let grid = TestGrid::build(
            GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(2.0), 2, 4),
            Vec::new(),
            GridVariant::default(),
        );

        let mut wnoise = WhiteNoise::new(0, UVec2::ZERO);

        let sample = grid.grid().sample_lights(
            &mut wnoise,
            Vec3::ONE,
            Vec3::Y,
            &IrradianceTarget,
        );

        assert_eq!(LightSample::NONE, sample);
        assert_eq!(LightId::new(0), sample.light_id);

        let pdf = grid.grid().sample_light_pdf(
            &mut wnoise,
            LightId::new(0),
            Vec3::ONE,
            Vec3::Y,
            &IrradianceTarget,
        );

        assert_eq!(0.0, pdf);

        for fast_merge in [false, true] {
            let mut out = LightListReservoir::default();

            grid.grid().sample_light_list::<4>(
                &mut wnoise,
                Vec3::ONE,
                Vec3::Y,
                &IrradianceTarget,
                fast_merge,
                &mut out,
            );

            out.finish();

            assert!(out.is_empty());
            assert_eq!(0.0, out.weight());
        }
    }

    #[test]
    fn outside_of_grid() {
        for policy in policies() {
            let grid = TestGrid::build(
                GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(2.0), 2, 2),
                vec![Light::point(Vec3::ONE, Vec3::ONE, 100.0)],
                GridVariant::new(policy),
            );

            let mut wnoise = WhiteNoise::new(0, UVec2::ZERO);
            let position = vec3(5.0, 1.0, 1.0);

            let sample = grid.grid().sample_lights(
                &mut wnoise,
                position,
                Vec3::ZERO,
                &IrradianceTarget,
            );

            let pdf = grid.grid().sample_light_pdf(
                &mut wnoise,
                LightId::new(0),
                position,
                Vec3::ZERO,
                &IrradianceTarget,
            );

            assert!(sample.is_none());
            assert_eq!(0.0, pdf);
        }
    }

    #[test]
    fn unsized_grid() {
        let lights = [Light::point(Vec3::ONE, Vec3::ONE, 100.0)];

        let grid = LightSamplerGrid::new(
            GridConfig::default(),
            &[],
            &[],
            LightsView::new(&lights, 1),
            GridVariant::default(),
        );

        let mut wnoise = WhiteNoise::new(0, UVec2::ZERO);

        let sample = grid.sample_lights(
            &mut wnoise,
            Vec3::ONE,
            Vec3::ZERO,
            &IrradianceTarget,
        );

        assert!(sample.is_none());
    }

    #[test]
    fn pdf_matches_sampling() {
        let lights = random_lights(64, 4);

        for octahedral in [false, true] {
            for policy in policies() {
                let variant = GridVariant::new(policy)
                    .with(GridVariant::OCTAHEDRAL, octahedral);

                let grid = TestGrid::build(
                    GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(8.0), 4, 8),
                    lights.clone(),
                    variant,
                );

                let grid = grid.grid();
                let mut rng = StdRng::seed_from_u64(5);

                for i in 0..200 {
                    let position = vec3(
                        rng.gen_range(0.0..8.0),
                        rng.gen_range(0.0..8.0),
                        rng.gen_range(0.0..8.0),
                    );

                    let normal = vec3(
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                    )
                    .normalize();

                    let wnoise = WhiteNoise::from_slot(i, 1);

                    let sample = grid.sample_lights(
                        &mut wnoise.clone(),
                        position,
                        normal,
                        &IrradianceTarget,
                    );

                    if sample.is_none() {
                        continue;
                    }

                    let pdf = grid.sample_light_pdf(
                        &mut wnoise.clone(),
                        sample.light_id,
                        position,
                        normal,
                        &IrradianceTarget,
                    );

                    assert_relative_eq!(sample.pdf, pdf, max_relative = 1.0e-5);
                }
            }
        }
    }

    /// Averaged over many builds, `1 / pdf` of the picked light estimates the
    /// number of lights that could've been picked.
    #[test]
    fn estimator_is_unbiased() {
        const TRIALS: u32 = 4_000;

        let lights = point_lights(40, 6);

        for policy in policies() {
            let mut sum = 0.0;

            for frame in 0..TRIALS {
                let grid = TestGrid::build_frame(
                    GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(8.0), 1, 4),
                    lights.clone(),
                    GridVariant::new(policy),
                    frame,
                );

                let sample = grid.grid().sample_lights(
                    &mut WhiteNoise::from_slot(0, frame),
                    Vec3::splat(4.0),
                    Vec3::ZERO,
                    &IrradianceTarget,
                );

                assert!(sample.is_some());
                sum += 1.0 / sample.pdf;
            }

            let mean = sum / (TRIALS as f32);

            assert!(
                (mean - 40.0).abs() < 40.0 * 0.06,
                "policy = {policy:?}, mean = {mean}"
            );
        }
    }

    #[test]
    fn light_list() {
        let lights = point_lights(40, 7);

        for fast_merge in [false, true] {
            let grid = TestGrid::build(
                GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(8.0), 2, 4),
                lights.clone(),
                GridVariant::default(),
            );

            let mut wnoise = WhiteNoise::from_slot(0, 0);
            let mut out = LightListReservoir::default();

            grid.grid().sample_light_list::<4>(
                &mut wnoise,
                vec3(4.0, 4.0, 4.0),
                Vec3::ZERO,
                &IrradianceTarget,
                fast_merge,
                &mut out,
            );

            out.finish();

            assert!(!out.is_empty(), "fast_merge = {fast_merge}");
            assert!(out.weight().is_finite());
            assert!(out.weight() > 0.0);
            assert!((out.light_id().get() as usize) < lights.len());
        }
    }

    /// With a single light, every non-empty candidate is that light picked
    /// with the probability of one, so the list's weight must come out as
    /// one as well.
    #[test]
    fn light_list_with_single_light() {
        let grid = TestGrid::build(
            GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(2.0), 1, 4),
            vec![Light::point(Vec3::ONE, Vec3::ONE, 100.0)],
            GridVariant::new(MergePolicy::WithoutReplacement),
        );

        for fast_merge in [false, true] {
            let mut wnoise = WhiteNoise::from_slot(0, 0);
            let mut out = LightListReservoir::default();

            grid.grid().sample_light_list::<4>(
                &mut wnoise,
                vec3(1.5, 1.5, 1.5),
                Vec3::ZERO,
                &IrradianceTarget,
                fast_merge,
                &mut out,
            );

            out.finish();

            assert_eq!(LightId::new(0), out.light_id());
            assert_relative_eq!(1.0, out.weight(), max_relative = 1.0e-5);
        }
    }

    /// Averaged over many builds, `target * weight` of the selected light
    /// estimates the sum of the targets of all lights, with and without the
    /// segmented merge.
    #[test]
    fn light_list_is_unbiased() {
        const TRIALS: u32 = 4_000;

        let lights = point_lights(40, 10);
        let expected = total_luma(&lights);

        for policy in policies() {
            for fast_merge in [false, true] {
                let mut sum = 0.0;

                for frame in 0..TRIALS {
                    let grid = TestGrid::build_frame(
                        GridConfig::from_bounds(
                            Vec3::ZERO,
                            Vec3::splat(8.0),
                            1,
                            4,
                        ),
                        lights.clone(),
                        GridVariant::new(policy),
                        frame,
                    );

                    let mut out = LightListReservoir::default();

                    grid.grid().sample_light_list::<4>(
                        &mut WhiteNoise::from_slot(0, frame),
                        Vec3::splat(4.0),
                        Vec3::ZERO,
                        &LumaTarget,
                        fast_merge,
                        &mut out,
                    );

                    out.finish();

                    if !out.is_empty() {
                        let light = lights[out.light_id().get() as usize];

                        sum += out.weight() * light.color().luma();
                    }
                }

                let mean = sum / (TRIALS as f32);

                assert!(
                    (mean - expected).abs() < expected * 0.06,
                    "policy = {policy:?}, fast_merge = {fast_merge}, \
                     mean = {mean}, expected = {expected}"
                );
            }
        }
    }

    #[test]
    fn light_list_with_fewer_reservoirs_than_candidates() {
        let lights = random_lights(10, 8);

        let grid = TestGrid::build(
            GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(8.0), 1, 2),
            lights,
            GridVariant::default(),
        );

        let mut wnoise = WhiteNoise::from_slot(0, 0);
        let mut out = LightListReservoir::default();

        grid.grid().sample_light_list::<8>(
            &mut wnoise,
            Vec3::splat(4.0),
            Vec3::ZERO,
            &IrradianceTarget,
            true,
            &mut out,
        );

        // Only two of the segments are non-empty
        assert_eq!(2.0, out.reservoir.m);
    }

    #[test]
    fn light_list_cone() {
        let lights = random_lights(40, 9);

        let grid = TestGrid::build(
            GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(8.0), 4, 4),
            lights.clone(),
            GridVariant::new(MergePolicy::WithReplacement),
        );

        let mut wnoise = WhiteNoise::from_slot(0, 0);
        let mut out = LightListReservoir::default();

        let cone = LightCone {
            origin: vec3(1.0, 1.0, 1.0),
            direction: vec3(1.0, 1.0, 1.0).normalize(),
            spread: 0.2,
            length: 6.0,
        };

        grid.grid().sample_light_list_cone::<4>(
            &mut wnoise,
            cone,
            Vec3::ZERO,
            &IrradianceTarget,
            &mut out,
        );

        out.finish();

        assert_eq!(4.0, out.reservoir.m);
        assert!(!out.is_empty());
        assert!((out.light_id().get() as usize) < lights.len());
    }

    /// Every candidate of a cone that stays within a single cell comes from
    /// that cell, so (for a target that doesn't depend on the position) the
    /// cone's list is as unbiased as a regular one.
    #[test]
    fn light_list_cone_is_unbiased() {
        const TRIALS: u32 = 4_000;

        let lights = point_lights(40, 11);
        let expected = total_luma(&lights);

        let cone = LightCone {
            origin: vec3(1.0, 1.0, 1.0),
            direction: vec3(1.0, 1.0, 1.0).normalize(),
            spread: 0.2,
            length: 6.0,
        };

        for policy in policies() {
            let mut sum = 0.0;

            for frame in 0..TRIALS {
                let grid = TestGrid::build_frame(
                    GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(8.0), 1, 4),
                    lights.clone(),
                    GridVariant::new(policy),
                    frame,
                );

                let mut out = LightListReservoir::default();

                grid.grid().sample_light_list_cone::<4>(
                    &mut WhiteNoise::from_slot(0, frame),
                    cone,
                    Vec3::ZERO,
                    &LumaTarget,
                    &mut out,
                );

                out.finish();

                if !out.is_empty() {
                    let light = lights[out.light_id().get() as usize];

                    sum += out.weight() * light.color().luma();
                }
            }

            let mean = sum / (TRIALS as f32);

            assert!(
                (mean - expected).abs() < expected * 0.06,
                "policy = {policy:?}, mean = {mean}, expected = {expected}"
            );
        }
    }
}
