use log::debug;

use super::LightSamplerBuffers;
use crate::{gpu, Bindable, ComputePass, Result, Shaders};

#[derive(Debug)]
pub struct LightSamplerPasses {
    pub bounds_reduce_min: ComputePass<gpu::BoundsReducePassParams>,
    pub bounds_reduce_max: ComputePass<gpu::BoundsReducePassParams>,
    pub calculate_bounds: ComputePass<gpu::CalculateBoundsPassParams>,
    pub grid_build: ComputePass<gpu::GridBuildPassParams>,
}

impl LightSamplerPasses {
    pub fn new(
        device: &wgpu::Device,
        shaders: &mut Shaders,
        buffers: &LightSamplerBuffers,
        lights: &dyn Bindable,
        variant: gpu::GridVariant,
    ) -> Result<Self> {
        debug!("Initializing light sampler passes; variant={variant:?}");

        let bounds_reduce_min = ComputePass::builder("bounds_reduce_min")
            .bind([
                &buffers.bounds_length.as_ro_bind(),
                &buffers.bounds_min.as_rw_bind(),
            ])
            .build(
                device,
                &shaders.bounds_reduce_min,
                Shaders::BOUNDS_REDUCE_MIN,
            );

        let bounds_reduce_max = ComputePass::builder("bounds_reduce_max")
            .bind([
                &buffers.bounds_length.as_ro_bind(),
                &buffers.bounds_max.as_rw_bind(),
            ])
            .build(
                device,
                &shaders.bounds_reduce_max,
                Shaders::BOUNDS_REDUCE_MAX,
            );

        let calculate_bounds = ComputePass::builder("calculate_bounds")
            .bind([
                &buffers.bounds_min.as_ro_bind(),
                &buffers.bounds_max.as_ro_bind(),
                &buffers.config.as_rw_bind(),
                &buffers.dispatch.as_rw_bind(),
            ])
            .build(
                device,
                &shaders.calculate_bounds,
                Shaders::CALCULATE_BOUNDS,
            );

        let (grid_build_module, grid_build_entry_point) =
            shaders.grid_build(device, variant)?;

        let grid_build = ComputePass::builder("grid_build")
            .bind([
                lights,
                &buffers.config.as_ro_bind(),
                &buffers.light_ids.as_rw_bind(),
                &buffers.light_weights.as_rw_bind(),
            ])
            .build(device, grid_build_module, &grid_build_entry_point);

        Ok(Self {
            bounds_reduce_min,
            bounds_reduce_max,
            calculate_bounds,
            grid_build,
        })
    }
}
