use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct BoundsReducePassParams {
    /// Number of entries shaders can append to.
    pub capacity: u32,

    /// Index of the entry written by the host, or `u32::MAX` if there's none.
    pub host_slot: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct CalculateBoundsPassParams {
    pub max_cells_per_axis: u32,
    pub reservoirs_per_cell: u32,

    /// See: [`crate::GridVariant::bits()`].
    pub variant: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GridBuildPassParams {
    pub frame: u32,
    pub light_count: u32,
}
