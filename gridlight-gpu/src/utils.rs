mod f32_ext;
mod vec3_ext;

pub use self::f32_ext::*;
pub use self::vec3_ext::*;

/// Synchronizes all invocations of the current workgroup, making their
/// workgroup-memory writes visible to each other.
///
/// On the host this is a no-op - the host-side dispatchers execute each phase
/// of a kernel for all lanes before moving onto the next phase.
#[inline]
pub fn workgroup_barrier() {
    #[cfg(target_arch = "spirv")]
    unsafe {
        spirv_std::arch::workgroup_memory_barrier_with_group_sync();
    }
}

/// Hermite interpolation between `edge0` and `edge1`, like GLSL's
/// `smoothstep()`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x >= edge0 { 1.0 } else { 0.0 };
    }

    let t = ((x - edge0) / (edge1 - edge0)).saturate();

    t * t * (3.0 - 2.0 * t)
}
