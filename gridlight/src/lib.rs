//! Host side of the light-sampler grid: allocates its buffers, loads its
//! compute kernels and records the commands that rebuild it every frame.
//!
//! Shaders that consume the grid depend on `gridlight-gpu` directly and bind
//! [`LightSampler::bind_readable()`].

mod bounds;
mod buffers;
mod error;
mod light;
mod light_sampler;
mod lights;
mod options;
mod pass;
mod shaders;

pub use gridlight_gpu as gpu;

pub use self::bounds::*;
pub use self::buffers::*;
pub use self::error::*;
pub use self::light::*;
pub use self::light_sampler::*;
pub use self::lights::*;
pub use self::options::*;
pub use self::pass::*;
pub use self::shaders::*;
