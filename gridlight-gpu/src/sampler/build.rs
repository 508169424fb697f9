use crate::{
    workgroup_barrier, GridConfig, GridReservoir, GridReservoirsMut,
    GridVariant, LightId, LightRegion, LightsView, OctahedralFace,
    StreamReservoir, WhiteNoise, BUILD_THREADS, WAVE_SIZE,
};

/// Partial result of a single lane of the parallel build, exchanged through
/// workgroup memory.
#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct PartialReservoir {
    pub light_id: LightId,
    pub sample_weight: f32,
    pub weight_sum: f32,
}

impl PartialReservoir {
    pub fn from_stream(stream: &StreamReservoir<LightId>) -> Self {
        Self {
            light_id: stream.sample,
            sample_weight: stream.sample_weight,
            weight_sum: if stream.is_empty() {
                0.0
            } else {
                stream.weight_sum
            },
        }
    }
}

pub type BuildScratch = [PartialReservoir; BUILD_THREADS as usize];

/// Rebuilds the grid's reservoirs from scratch.
///
/// Reservoir `r` of every cell (and face) streams lights `r, r + R, r + 2R,
/// ...`, where `R` is the number of reservoirs per cell, so that a cell's
/// reservoirs cover disjoint subsets of the lights and a light can only ever
/// be stored in a single reservoir of the cell.
pub struct GridBuilder<'a> {
    config: GridConfig,
    lights: LightsView<'a>,
    variant: GridVariant,
    frame: u32,
}

impl<'a> GridBuilder<'a> {
    const WAVE_COLLAPSE_STREAM: u32 = BUILD_THREADS;
    const GROUP_COLLAPSE_STREAM: u32 =
        BUILD_THREADS + BUILD_THREADS / WAVE_SIZE;

    pub fn new(
        config: GridConfig,
        lights: LightsView<'a>,
        variant: GridVariant,
        frame: u32,
    ) -> Self {
        Self {
            config,
            lights,
            variant,
            frame,
        }
    }

    pub fn slot_count(&self) -> u32 {
        if self.config.is_valid() {
            self.config.slot_count(self.variant.faces())
        } else {
            0
        }
    }

    /// Returns the region whose lights given slot samples.
    pub fn slot_region(&self, slot: u32) -> LightRegion {
        let faces = self.variant.faces();
        let cell_face = slot / self.config.reservoirs_per_cell();
        let cell = self.config.cell_from_index(cell_face / faces);
        let region = self.config.cell_region(cell);

        if self.variant.is_octahedral() {
            region.with_face(OctahedralFace::new(cell_face % faces).direction())
        } else {
            region
        }
    }

    /// Streams every `step`-th light of given slot's interleaved sequence,
    /// starting at the `first`-th one.
    fn stream(
        &self,
        wnoise: &mut WhiteNoise,
        slot: u32,
        first: u32,
        step: u32,
    ) -> StreamReservoir<LightId> {
        let reservoirs = self.config.reservoirs_per_cell();
        let region = self.slot_region(slot);
        let centroid = self.variant.is_centroid();
        let mut reservoir = StreamReservoir::default();

        let mut light = slot % reservoirs + first * reservoirs;

        while light < self.lights.len() {
            let light_id = LightId::new(light);
            let score = self.lights.get(light_id).importance(&region, centroid);

            reservoir.update(wnoise, light_id, score);
            light += step * reservoirs;
        }

        reservoir
    }

    /// Builds given slot with a single invocation.
    pub fn build_slot(&self, slot: u32) -> GridReservoir {
        let mut wnoise = WhiteNoise::from_slot(slot, self.frame);

        GridReservoir::from_stream(&self.stream(&mut wnoise, slot, 0, 1))
    }

    /// Builds a lane's share of given slot; lanes together cover the slot's
    /// entire light sequence, with lane `l` taking the elements congruent to
    /// [`lane_offset(l)`] modulo [`BUILD_THREADS`].
    pub fn build_lane(&self, slot: u32, lane: u32) -> PartialReservoir {
        let mut wnoise =
            WhiteNoise::from_slot(slot, self.frame).with_stream(lane);

        PartialReservoir::from_stream(&self.stream(
            &mut wnoise,
            slot,
            lane_offset(lane),
            BUILD_THREADS,
        ))
    }

    /// Merges `count` partial reservoirs, located `stride` elements apart,
    /// starting at `offset`.
    fn collapse(
        wnoise: &mut WhiteNoise,
        scratch: &BuildScratch,
        offset: u32,
        count: u32,
        stride: u32,
    ) -> StreamReservoir<LightId> {
        let mut reservoir = StreamReservoir::default();
        let mut i = 0;

        while i < count {
            let partial = scratch[(offset + i * stride) as usize];

            reservoir.update_ex(
                wnoise,
                partial.light_id,
                partial.sample_weight,
                partial.weight_sum,
            );

            i += 1;
        }

        reservoir
    }

    /// Wave-level collapse: the first lane of each wave merges its wave's
    /// partial reservoirs into the wave's first scratch element; other lanes
    /// do nothing.
    pub fn collapse_wave(
        &self,
        slot: u32,
        lane: u32,
        scratch: &mut BuildScratch,
    ) {
        if lane % WAVE_SIZE != 0 {
            return;
        }

        let wave = lane / WAVE_SIZE;

        let mut wnoise = WhiteNoise::from_slot(slot, self.frame)
            .with_stream(Self::WAVE_COLLAPSE_STREAM + wave);

        let reservoir =
            Self::collapse(&mut wnoise, scratch, lane, WAVE_SIZE, 1);

        scratch[lane as usize] = PartialReservoir::from_stream(&reservoir);
    }

    /// Final collapse, executed by lane 0 alone: merges either the per-wave
    /// results (if [`GridVariant::WAVE_COLLAPSE`] is enabled) or all of the
    /// lanes' partial reservoirs.
    pub fn collapse_group(
        &self,
        slot: u32,
        scratch: &BuildScratch,
    ) -> GridReservoir {
        let mut wnoise = WhiteNoise::from_slot(slot, self.frame)
            .with_stream(Self::GROUP_COLLAPSE_STREAM);

        let reservoir = if self.variant.is_wave_collapse() {
            Self::collapse(
                &mut wnoise,
                scratch,
                0,
                BUILD_THREADS / WAVE_SIZE,
                WAVE_SIZE,
            )
        } else {
            Self::collapse(&mut wnoise, scratch, 0, BUILD_THREADS, 1)
        };

        GridReservoir::from_stream(&reservoir)
    }

    /// Entry point of the single-lane build, executed for each work item.
    pub fn run_serial(&self, item: u32, out: &mut GridReservoirsMut) {
        if item >= self.slot_count() {
            return;
        }

        out.set(item, self.build_slot(item));
    }

    /// Entry point of the parallel build, executed by each lane of the
    /// workgroup responsible for given slot.
    ///
    /// Must be reached by all lanes of the workgroup, since it synchronizes
    /// on the scratch memory.
    pub fn run_parallel(
        &self,
        slot: u32,
        lane: u32,
        scratch: &mut BuildScratch,
        out: &mut GridReservoirsMut,
    ) {
        if slot >= self.slot_count() {
            return;
        }

        scratch[lane as usize] = self.build_lane(slot, lane);
        workgroup_barrier();

        if self.variant.is_wave_collapse() {
            self.collapse_wave(slot, lane, scratch);
            workgroup_barrier();
        }

        if lane == 0 {
            out.set(slot, self.collapse_group(slot, scratch));
        }
    }
}

/// Returns position of given lane within the stream, as a bit-reversal of
/// the lane index.
///
/// Any bijection works; bit-reversal spreads neighbouring lanes (which share
/// a wave) across the stream, so that each wave covers lights from all over
/// the scene instead of a contiguous run.
pub fn lane_offset(lane: u32) -> u32 {
    lane.reverse_bits() >> (32 - BUILD_THREADS.trailing_zeros())
}
