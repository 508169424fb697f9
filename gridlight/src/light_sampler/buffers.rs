use std::mem;

use glam::Vec4;

use crate::{gpu, Error, LightSamplerOptions, Result, UnmappedStorageBuffer};

/// Sizes the sampler's buffers have been allocated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightSamplerBuffersLayout {
    pub bounds_capacity: u32,
    pub slots: u64,
    pub weights_stride: u32,
}

impl LightSamplerBuffersLayout {
    pub fn new(
        options: &LightSamplerOptions,
        variant: gpu::GridVariant,
        bounds_capacity: u32,
    ) -> Self {
        let max_cells = options.max_cells_per_axis as u64;

        Self {
            bounds_capacity,
            slots: max_cells.pow(3)
                * (options.lights_per_cell as u64)
                * (variant.faces() as u64),
            weights_stride: variant.weights_stride(),
        }
    }

    fn light_ids_size(&self) -> u64 {
        self.slots * (mem::size_of::<u32>() as u64)
    }

    fn light_weights_size(&self) -> u64 {
        self.slots
            * (self.weights_stride as u64)
            * (mem::size_of::<f32>() as u64)
    }

    fn bounds_size(&self) -> u64 {
        (self.bounds_capacity as u64) * (mem::size_of::<Vec4>() as u64)
    }

    /// Checks whether all buffers fit within device's limits.
    fn validate(&self, device: &wgpu::Device) -> Result<()> {
        let limit = device.limits().max_storage_buffer_binding_size as u64;

        let size = self
            .light_ids_size()
            .max(self.light_weights_size())
            .max(self.bounds_size());

        if size > limit {
            return Err(Error::GridTooLarge { size, limit });
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct LightSamplerBuffers {
    pub layout: LightSamplerBuffersLayout,

    /// Number of entries appended to `bounds_min` and `bounds_max` by
    /// shaders during the current frame.
    pub bounds_length: UnmappedStorageBuffer,
    pub bounds_min: UnmappedStorageBuffer,
    pub bounds_max: UnmappedStorageBuffer,

    pub config: UnmappedStorageBuffer,
    pub dispatch: UnmappedStorageBuffer,

    pub light_ids: UnmappedStorageBuffer,
    pub light_weights: UnmappedStorageBuffer,
}

impl LightSamplerBuffers {
    pub fn new(
        device: &wgpu::Device,
        layout: LightSamplerBuffersLayout,
    ) -> Result<Self> {
        layout.validate(device)?;

        Ok(Self {
            layout,

            bounds_length: UnmappedStorageBuffer::new(
                device,
                "gridlight_bounds_length",
                mem::size_of::<u32>(),
            ),

            bounds_min: UnmappedStorageBuffer::new(
                device,
                "gridlight_bounds_min",
                layout.bounds_size() as usize,
            ),

            bounds_max: UnmappedStorageBuffer::new(
                device,
                "gridlight_bounds_max",
                layout.bounds_size() as usize,
            ),

            config: UnmappedStorageBuffer::new(
                device,
                "gridlight_config",
                mem::size_of::<gpu::GridConfig>(),
            ),

            dispatch: UnmappedStorageBuffer::new_indirect(
                device,
                "gridlight_dispatch",
                mem::size_of::<gpu::DispatchCommand>(),
            ),

            light_ids: UnmappedStorageBuffer::new(
                device,
                "gridlight_light_ids",
                layout.light_ids_size() as usize,
            ),

            light_weights: UnmappedStorageBuffer::new(
                device,
                "gridlight_light_weights",
                layout.light_weights_size() as usize,
            ),
        })
    }
}
