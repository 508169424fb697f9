#![cfg_attr(target_arch = "spirv", no_std)]

pub mod bounds_reduce;
pub mod calculate_bounds;
pub mod grid_build;
