use gridlight_gpu::prelude::*;

#[spirv(compute(threads(1)))]
pub fn main(
    #[spirv(push_constant)] params: &CalculateBoundsPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    bounds_min: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    bounds_max: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    config: &mut GridConfig,
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    dispatch: &mut DispatchCommand,
) {
    config.resize(
        bounds_min[0].xyz(),
        bounds_max[0].xyz(),
        params.max_cells_per_axis,
        params.reservoirs_per_cell,
    );

    let variant = GridVariant::from_bits(params.variant);

    *dispatch = DispatchCommand::for_grid(config, variant);
}
