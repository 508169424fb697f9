use gridlight_gpu::prelude::*;

/// Generates one entry point per build key (see
/// [`GridVariant::build_key()`]), so that each variant gets compiled with
/// its flags known up front.
macro_rules! entry_points {
    ($($name:ident => $key:literal,)*) => {
        $(
            #[spirv(compute(threads(128)))]
            #[allow(clippy::too_many_arguments)]
            pub fn $name(
                #[spirv(workgroup_id)] workgroup_id: UVec3,
                #[spirv(num_workgroups)] num_workgroups: UVec3,
                #[spirv(local_invocation_index)] local_idx: u32,
                #[spirv(push_constant)] params: &GridBuildPassParams,
                #[spirv(workgroup)] scratch: &mut BuildScratch,
                #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
                lights: &[Light],
                #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
                config: &GridConfig,
                #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
                light_ids: &mut [u32],
                #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
                light_weights: &mut [f32],
            ) {
                main_inner(
                    GridVariant::from_build_key($key),
                    DispatchCommand::flat_group(workgroup_id, num_workgroups),
                    local_idx,
                    params,
                    scratch,
                    lights,
                    config,
                    light_ids,
                    light_weights,
                );
            }
        )*
    };
}

entry_points! {
    main_0 => 0,
    main_1 => 1,
    main_2 => 2,
    main_3 => 3,
    main_4 => 4,
    main_5 => 5,
    main_6 => 6,
    main_7 => 7,
    main_10 => 10,
    main_11 => 11,
    main_14 => 14,
    main_15 => 15,
    main_16 => 16,
    main_17 => 17,
    main_18 => 18,
    main_19 => 19,
    main_20 => 20,
    main_21 => 21,
    main_22 => 22,
    main_23 => 23,
    main_26 => 26,
    main_27 => 27,
    main_30 => 30,
    main_31 => 31,
}

#[allow(clippy::too_many_arguments)]
fn main_inner(
    variant: GridVariant,
    group: u32,
    local_idx: u32,
    params: &GridBuildPassParams,
    scratch: &mut BuildScratch,
    lights: &[Light],
    config: &GridConfig,
    light_ids: &mut [u32],
    light_weights: &mut [f32],
) {
    let builder = GridBuilder::new(
        *config,
        LightsView::new(lights, params.light_count),
        variant,
        params.frame,
    );

    let mut out = GridReservoirsMut::new(light_ids, light_weights, variant);

    if variant.is_parallel() {
        builder.run_parallel(group, local_idx, scratch, &mut out);
    } else {
        builder.run_serial(group * BUILD_THREADS + local_idx, &mut out);
    }
}
