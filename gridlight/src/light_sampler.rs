mod buffers;
mod changes;
mod passes;

use std::hash::Hash;
use std::mem;
use std::path::Path;

use glam::{uvec3, Vec4};
use log::{debug, info, trace};

pub use self::buffers::*;
pub use self::changes::*;
pub use self::passes::*;
use crate::{
    gpu, BoundingBox, BoundsReservations, BufferFlushOutcome, CallerId,
    LightSamplerOptions, Lights, Result, Shaders, UnmappedStorageBuffersBinder,
};

/// Grid of light reservoirs rebuilt every frame, which shaders can then
/// query for lights worth sampling around a given point.
///
/// Each frame goes through:
///
/// - reducing the locations recorded by shaders (plus the bounds provided by
///   the host) into the scene's bounds,
/// - resizing the grid to cover those bounds,
/// - rebuilding the reservoirs of each cell.
#[derive(Debug)]
pub struct LightSampler {
    options: LightSamplerOptions,
    shaders: Shaders,
    reservations: BoundsReservations,
    scene_bounds: BoundingBox,
    scene_bounds_changed: bool,
    variant: Option<gpu::GridVariant>,
    buffers: LightSamplerBuffers,
    passes: Option<LightSamplerPasses>,

    /// Changes gathered since the last successful update.
    pending: LightSamplerChanges,

    /// Changes made by the last successful update.
    changes: LightSamplerChanges,
}

impl LightSampler {
    pub fn new(
        device: &wgpu::Device,
        shaders_dir: impl AsRef<Path>,
        options: LightSamplerOptions,
    ) -> Result<Self> {
        let options = options.sanitize();

        info!("Initializing light sampler; options={options:?}");

        let shaders = Shaders::load(device, shaders_dir)?;
        let reservations = BoundsReservations::default();

        let buffers = LightSamplerBuffers::new(
            device,
            LightSamplerBuffersLayout::new(
                &options,
                options.variant(0),
                reservations.capacity(),
            ),
        )?;

        debug!("Light sampler initialized");

        Ok(Self {
            options,
            shaders,
            reservations,
            scene_bounds: BoundingBox::default(),
            scene_bounds_changed: false,
            variant: None,
            buffers,
            passes: None,
            pending: LightSamplerChanges::all(),
            changes: Default::default(),
        })
    }

    pub fn options(&self) -> &LightSamplerOptions {
        &self.options
    }

    /// Changes options; takes effect on the next [`Self::update()`].
    pub fn set_options(&mut self, options: LightSamplerOptions) {
        let options = options.sanitize();

        if options != self.options {
            debug!("Light sampler options changed: {options:?}");

            self.options = options;
            self.pending.light_settings_updated = true;
        }
    }

    /// Registers that given caller records sample locations from `lanes`
    /// shader invocations per frame (see: [`gpu::request_location()`]).
    ///
    /// Passing zero withdraws the reservation.
    pub fn reserve_bounds_values(&mut self, caller: CallerId, lanes: u32) {
        self.reservations.reserve(caller, lanes);
    }

    /// Provides scene bounds from the host; merged with bounds provided by
    /// other callers and with locations recorded by shaders.
    pub fn set_bounds(&mut self, caller: CallerId, bounds: BoundingBox) {
        self.reservations.set_bounds(caller, bounds);
    }

    /// Provides bounds of the entire scene, used when no shader records
    /// sample locations.
    pub fn set_scene_bounds(&mut self, bounds: BoundingBox) {
        if self.scene_bounds != bounds {
            self.scene_bounds = bounds;
            self.scene_bounds_changed = true;
        }
    }

    /// Number of entries shaders recording sample locations can append to
    /// the bounds buffers.
    pub fn bounds_capacity(&self) -> u32 {
        self.reservations.device_entries()
    }

    /// Returns the variant the grid was built with last time.
    pub fn variant(&self) -> Option<gpu::GridVariant> {
        self.variant
    }

    /// Returns the key consumer shaders must be specialized for (see:
    /// [`gpu::GridVariant::query_key()`]).
    pub fn shader_variant(&self) -> u32 {
        self.variant
            .unwrap_or_else(|| self.options.variant(0))
            .query_key()
    }

    /// Returns what the last update changed.
    pub fn changes(&self) -> LightSamplerChanges {
        self.changes
    }

    /// Returns whether the last update changed the variant in a way consumer
    /// shaders have to be recompiled for.
    pub fn needs_recompile(&self) -> bool {
        self.changes.needs_recompile
    }

    /// Returns whether the last update reallocated buffers (the grid's or the
    /// lights'), so bind groups referring to them have to be recreated.
    pub fn needs_rebind(&self) -> bool {
        self.changes.needs_rebind
    }

    /// Returns whether the last update rebuilt the grid with different
    /// options or lights.
    pub fn light_settings_updated(&self) -> bool {
        self.changes.light_settings_updated
    }

    /// Records commands that rebuild the grid.
    ///
    /// Locations recorded by shaders that ran earlier on the same queue are
    /// consumed here, so consumers should record them before calling this
    /// function and query the grid after.
    pub fn update<H>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        lights: &mut Lights<H>,
        frame: u32,
    ) -> Result<()>
    where
        H: Eq + Hash,
    {
        let lights_outcome = lights.flush(device, queue);

        if lights_outcome != BufferFlushOutcome::Unchanged {
            trace!("Lights changed: {lights_outcome:?}");

            self.pending.lights_flushed(lights_outcome);

            if lights_outcome.is_reallocated() {
                self.passes = None;
            }
        }

        let variant = self.options.variant(lights.len());

        if self.variant != Some(variant) {
            debug!("Grid variant changed: {:?} -> {variant:?}", self.variant);

            self.pending.variant_changed(self.variant, variant);
            self.variant = Some(variant);
            self.passes = None;
        }

        // ---

        let own_caller = CallerId::of::<Self>();

        if self.reservations.has_device_reservations() {
            self.reservations
                .set_bounds(own_caller, BoundingBox::default());

            self.scene_bounds_changed = true;
        } else if mem::take(&mut self.scene_bounds_changed) {
            trace!("Using scene bounds: {:?}", self.scene_bounds);

            self.reservations.set_bounds(own_caller, self.scene_bounds);
        }

        // ---

        let layout = LightSamplerBuffersLayout::new(
            &self.options,
            variant,
            self.reservations.capacity(),
        );

        if layout != self.buffers.layout {
            debug!("Reallocating light sampler buffers; layout={layout:?}");

            self.buffers = LightSamplerBuffers::new(device, layout)?;
            self.pending.buffers_reallocated();
            self.passes = None;
        }

        // Passes get dropped whenever something they bind or run changes, and
        // stay dropped until rebuilding them succeeds
        if self.passes.is_none() {
            self.passes = Some(LightSamplerPasses::new(
                device,
                &mut self.shaders,
                &self.buffers,
                &lights.bind_readable(),
                variant,
            )?);
        }

        self.changes = mem::take(&mut self.pending);

        let Some(passes) = &self.passes else {
            return Ok(());
        };

        // ---

        let host_bounds = self.reservations.host_bounds();

        let host_slot = if host_bounds.is_set() {
            let host_slot = self.reservations.host_slot();
            let offset = (host_slot as u64) * (mem::size_of::<Vec4>() as u64);

            queue.write_buffer(
                self.buffers.bounds_min.buffer(),
                offset,
                bytemuck::bytes_of(&host_bounds.min().extend(0.0)),
            );

            queue.write_buffer(
                self.buffers.bounds_max.buffer(),
                offset,
                bytemuck::bytes_of(&host_bounds.max().extend(0.0)),
            );

            host_slot
        } else {
            u32::MAX
        };

        let reduce_params = gpu::BoundsReducePassParams {
            capacity: self.reservations.device_entries(),
            host_slot,
        };

        passes
            .bounds_reduce_min
            .run(encoder, uvec3(1, 1, 1), reduce_params);

        passes
            .bounds_reduce_max
            .run(encoder, uvec3(1, 1, 1), reduce_params);

        encoder.clear_buffer(self.buffers.bounds_length.buffer(), 0, None);

        passes.calculate_bounds.run(
            encoder,
            uvec3(1, 1, 1),
            gpu::CalculateBoundsPassParams {
                max_cells_per_axis: self.options.max_cells_per_axis,
                reservoirs_per_cell: self.options.lights_per_cell,
                variant: variant.bits(),
            },
        );

        passes.grid_build.run_indirect(
            encoder,
            self.buffers.dispatch.buffer(),
            gpu::GridBuildPassParams {
                frame,
                light_count: lights.len(),
            },
        );

        Ok(())
    }

    /// Binds the grid (config, light ids, light weights) for shaders that
    /// query it.
    pub fn bind_readable(&self) -> UnmappedStorageBuffersBinder<'_, 3> {
        UnmappedStorageBuffersBinder {
            items: [
                self.buffers.config.as_ro_bind(),
                self.buffers.light_ids.as_ro_bind(),
                self.buffers.light_weights.as_ro_bind(),
            ],
        }
    }

    /// Binds the bounds buffers (length, min, max) for shaders that record
    /// sample locations.
    pub fn bind_bounds(&self) -> UnmappedStorageBuffersBinder<'_, 3> {
        UnmappedStorageBuffersBinder {
            items: [
                self.buffers.bounds_length.as_rw_bind(),
                self.buffers.bounds_min.as_rw_bind(),
                self.buffers.bounds_max.as_rw_bind(),
            ],
        }
    }
}
