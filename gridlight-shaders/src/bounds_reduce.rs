use gridlight_gpu::prelude::*;

#[spirv(compute(threads(256)))]
pub fn min(
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(push_constant)] params: &BoundsReducePassParams,
    #[spirv(workgroup)] scratch: &mut ReduceScratch,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)] length: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    values: &mut [Vec4],
) {
    main_inner::<REDUCE_MIN>(local_idx, params, scratch, length, values);
}

#[spirv(compute(threads(256)))]
pub fn max(
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(push_constant)] params: &BoundsReducePassParams,
    #[spirv(workgroup)] scratch: &mut ReduceScratch,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)] length: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    values: &mut [Vec4],
) {
    main_inner::<REDUCE_MAX>(local_idx, params, scratch, length, values);
}

fn main_inner<const OP: u32>(
    local_idx: u32,
    params: &BoundsReducePassParams,
    scratch: &mut ReduceScratch,
    length: &[u32],
    values: &mut [Vec4],
) {
    BoundsReduction::<OP>::run(
        scratch,
        values,
        length[0],
        params.capacity,
        params.host_slot,
        local_idx,
    );
}
