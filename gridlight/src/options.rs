use log::warn;

use crate::gpu;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightSamplerOptions {
    /// Number of cells along the longest axis of the scene; shorter axes get
    /// proportionally fewer cells.
    pub max_cells_per_axis: u32,

    /// Number of reservoirs stored per cell (and per face, if octahedral).
    pub lights_per_cell: u32,

    /// Whether each cell keeps a separate set of reservoirs for each of the
    /// eight octants a surface normal can point towards.
    pub octahedral: bool,

    pub merge_policy: gpu::MergePolicy,

    /// Whether the build may split each reservoir's stream across a whole
    /// workgroup; only engages when there are enough lights to keep all of
    /// the lanes busy.
    pub parallel_build: bool,

    /// Whether the parallel build collapses lanes per wave before collapsing
    /// the waves; otherwise a single lane collapses the whole workgroup.
    pub wave_collapse: bool,

    /// Whether lights are scored at the cell's center instead of against the
    /// cell's bounds; cheaper, but biased towards lights close to the center.
    pub centroid_build: bool,
}

impl LightSamplerOptions {
    /// Returns options with values that'd make the grid unusable clamped to
    /// the nearest valid ones.
    pub fn sanitize(mut self) -> Self {
        if self.max_cells_per_axis == 0 {
            warn!("max_cells_per_axis must be at least 1; clamping");

            self.max_cells_per_axis = 1;
        }

        if self.lights_per_cell == 0 {
            warn!("lights_per_cell must be at least 1; clamping");

            self.lights_per_cell = 1;
        }

        self
    }

    /// Returns the grid variant these options select for given number of
    /// lights.
    pub fn variant(&self, light_count: u32) -> gpu::GridVariant {
        let parallel = self.parallel_build
            && (light_count as u64)
                > (gpu::BUILD_THREADS as u64) * (self.lights_per_cell as u64);

        gpu::GridVariant::new(self.merge_policy)
            .with(gpu::GridVariant::OCTAHEDRAL, self.octahedral)
            .with(gpu::GridVariant::PARALLEL_BUILD, parallel)
            .with(
                gpu::GridVariant::WAVE_COLLAPSE,
                parallel && self.wave_collapse,
            )
            .with(gpu::GridVariant::CENTROID_BUILD, self.centroid_build)
    }
}

impl Default for LightSamplerOptions {
    fn default() -> Self {
        Self {
            max_cells_per_axis: 16,
            lights_per_cell: 64,
            octahedral: false,
            merge_policy: gpu::MergePolicy::WithoutReplacement,
            parallel_build: false,
            wave_collapse: true,
            centroid_build: false,
        }
    }
}
