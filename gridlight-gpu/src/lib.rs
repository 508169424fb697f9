//! Common structs and algorithms used by Gridlight's shaders and host-side
//! renderer: light representation, streaming reservoirs, grid geometry and
//! the grid's build & query logic.

#![cfg_attr(target_arch = "spirv", no_std)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]

mod bounds;
mod dispatch;
mod grid;
mod light;
mod lights;
mod noise;
mod passes;
mod reservoir;
mod sampler;
mod utils;

pub use self::bounds::*;
pub use self::dispatch::*;
pub use self::grid::*;
pub use self::light::*;
pub use self::lights::*;
pub use self::noise::*;
pub use self::passes::*;
pub use self::reservoir::*;
pub use self::sampler::*;
pub use self::utils::*;

pub mod prelude {
    pub use spirv_std::glam::*;
    #[cfg(target_arch = "spirv")]
    pub use spirv_std::num_traits::Float;
    pub use spirv_std::spirv;

    pub use crate::*;
}

/// Number of invocations within a single workgroup of the grid-build kernel;
/// in the parallel build, that's also the number of lanes sharing a single
/// reservoir.
pub const BUILD_THREADS: u32 = 128;

/// Assumed number of invocations within a single wave (subgroup).
pub const WAVE_SIZE: u32 = 32;
