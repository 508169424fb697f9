use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::{workgroup_barrier, WAVE_SIZE};

/// Append-only list of bounding boxes, filled by shaders that know where the
/// interesting parts of the scene are; the boxes get reduced into a single
/// one right before the grid is sized.
///
/// Entries are appended through an atomic counter; entries past `capacity`
/// are dropped (the counter keeps growing though, so the reduction must clamp
/// it).
pub struct BoundsAccumulator<'a> {
    length: &'a mut u32,
    mins: &'a mut [Vec4],
    maxs: &'a mut [Vec4],
    capacity: u32,
}

impl<'a> BoundsAccumulator<'a> {
    pub fn new(
        length: &'a mut u32,
        mins: &'a mut [Vec4],
        maxs: &'a mut [Vec4],
        capacity: u32,
    ) -> Self {
        Self {
            length,
            mins,
            maxs,
            capacity,
        }
    }

    /// Appends given box; returns whether it fit within the buffer.
    pub fn push(&mut self, min: Vec3, max: Vec3) -> bool {
        let idx = self.reserve();

        if idx >= self.capacity {
            return false;
        }

        self.mins[idx as usize] = min.extend(0.0);
        self.maxs[idx as usize] = max.extend(0.0);

        true
    }

    #[cfg(target_arch = "spirv")]
    fn reserve(&mut self) -> u32 {
        use spirv_std::memory::{Scope, Semantics};

        unsafe {
            spirv_std::arch::atomic_i_increment::<
                u32,
                { Scope::Device as u32 },
                { Semantics::NONE.bits() },
            >(self.length)
        }
    }

    #[cfg(not(target_arch = "spirv"))]
    fn reserve(&mut self) -> u32 {
        let idx = *self.length;

        *self.length += 1;
        idx
    }
}

/// Workgroup-shared memory used by [`request_location()`]; `N` is the
/// workgroup size.
#[derive(Clone, Copy)]
pub struct LocationScratch<const N: usize> {
    pub mins: [Vec4; N],
    pub maxs: [Vec4; N],
}

impl<const N: usize> Default for LocationScratch<N> {
    fn default() -> Self {
        Self {
            mins: [Vec4::ZERO; N],
            maxs: [Vec4::ZERO; N],
        }
    }
}

/// First phase of [`request_location()`]: publishes the lane's position
/// (if any) to the workgroup.
pub fn stage_location<const N: usize>(
    scratch: &mut LocationScratch<N>,
    lane: u32,
    position: Vec3,
    is_active: bool,
) {
    if is_active {
        scratch.mins[lane as usize] = position.extend(0.0);
        scratch.maxs[lane as usize] = position.extend(0.0);
    } else {
        scratch.mins[lane as usize] = Vec4::splat(f32::MAX);
        scratch.maxs[lane as usize] = Vec4::splat(f32::MIN);
    }
}

/// Second phase of [`request_location()`]: the first lane of each wave
/// reduces the wave's positions and appends a single box covering them.
pub fn flush_locations<const N: usize>(
    scratch: &LocationScratch<N>,
    lane: u32,
    accumulator: &mut BoundsAccumulator,
) {
    if lane % WAVE_SIZE != 0 {
        return;
    }

    let mut min = Vec4::splat(f32::MAX);
    let mut max = Vec4::splat(f32::MIN);
    let mut idx = lane;

    while idx < lane + WAVE_SIZE && (idx as usize) < N {
        min = min.min(scratch.mins[idx as usize]);
        max = max.max(scratch.maxs[idx as usize]);
        idx += 1;
    }

    if min.xyz().cmple(max.xyz()).all() {
        accumulator.push(min.xyz(), max.xyz());
    }
}

/// Registers world-space position of the current invocation, so that the
/// grid gets sized to cover it.
///
/// Must be called uniformly by all invocations of the workgroup, since it
/// synchronizes on the workgroup's scratch memory; inactive invocations (e.g.
/// ones that hit the sky) should pass `is_active: false`.
pub fn request_location<const N: usize>(
    scratch: &mut LocationScratch<N>,
    accumulator: &mut BoundsAccumulator,
    lane: u32,
    position: Vec3,
    is_active: bool,
) {
    stage_location(scratch, lane, position, is_active);
    workgroup_barrier();
    flush_locations(scratch, lane, accumulator);
}

/// Number of invocations of the bounds-reduction kernel.
pub const REDUCE_THREADS: u32 = 256;

pub type ReduceScratch = [Vec4; REDUCE_THREADS as usize];

/// Parallel reduction of the accumulated bounds into the buffer's first
/// element, executed by a single workgroup of [`REDUCE_THREADS`] invocations.
///
/// `OP` selects between [`REDUCE_MIN`] and [`REDUCE_MAX`]; minimums and
/// maximums live in separate buffers, so each one gets reduced separately.
pub struct BoundsReduction<const OP: u32>;

impl<const OP: u32> BoundsReduction<OP> {
    pub fn identity() -> Vec4 {
        if OP == REDUCE_MIN {
            Vec4::splat(f32::MAX)
        } else {
            Vec4::splat(f32::MIN)
        }
    }

    pub fn apply(lhs: Vec4, rhs: Vec4) -> Vec4 {
        if OP == REDUCE_MIN {
            lhs.min(rhs)
        } else {
            lhs.max(rhs)
        }
    }

    /// First phase: each lane folds a strided subset of the appended entries
    /// (clamped to `capacity`) into its scratch slot; lane 0 additionally
    /// folds the host-provided entry at `host_slot`, if any.
    pub fn fold(
        scratch: &mut ReduceScratch,
        values: &[Vec4],
        length: u32,
        capacity: u32,
        host_slot: u32,
        lane: u32,
    ) {
        let length = length.min(capacity);
        let mut acc = Self::identity();
        let mut idx = lane;

        while idx < length {
            acc = Self::apply(acc, values[idx as usize]);
            idx += REDUCE_THREADS;
        }

        if lane == 0 && host_slot != u32::MAX {
            acc = Self::apply(acc, values[host_slot as usize]);
        }

        scratch[lane as usize] = acc;
    }

    /// Tree-reduction step; called with strides `REDUCE_THREADS / 2, ..., 1`,
    /// with a workgroup barrier after each one.
    pub fn step(scratch: &mut ReduceScratch, lane: u32, stride: u32) {
        if lane < stride {
            scratch[lane as usize] = Self::apply(
                scratch[lane as usize],
                scratch[(lane + stride) as usize],
            );
        }
    }

    /// Executes the entire reduction for given lane.
    pub fn run(
        scratch: &mut ReduceScratch,
        values: &mut [Vec4],
        length: u32,
        capacity: u32,
        host_slot: u32,
        lane: u32,
    ) {
        Self::fold(scratch, values, length, capacity, host_slot, lane);
        workgroup_barrier();

        let mut stride = REDUCE_THREADS / 2;

        while stride > 0 {
            Self::step(scratch, lane, stride);
            workgroup_barrier();
            stride /= 2;
        }

        if lane == 0 {
            values[0] = scratch[0];
        }
    }
}

pub const REDUCE_MIN: u32 = 0;
pub const REDUCE_MAX: u32 = 1;

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    /// Executes the reduction the way a workgroup would: each phase for all
    /// lanes before the next one.
    fn reduce<const OP: u32>(
        values: &mut [Vec4],
        length: u32,
        capacity: u32,
        host_slot: u32,
    ) -> Vec4 {
        let mut scratch = [Vec4::ZERO; REDUCE_THREADS as usize];

        for lane in 0..REDUCE_THREADS {
            BoundsReduction::<OP>::fold(
                &mut scratch,
                values,
                length,
                capacity,
                host_slot,
                lane,
            );
        }

        let mut stride = REDUCE_THREADS / 2;

        while stride > 0 {
            for lane in 0..REDUCE_THREADS {
                BoundsReduction::<OP>::step(&mut scratch, lane, stride);
            }

            stride /= 2;
        }

        scratch[0]
    }

    #[test]
    fn push_and_reduce() {
        let mut length = 0;
        let mut mins = vec![Vec4::ZERO; 1000];
        let mut maxs = vec![Vec4::ZERO; 1000];

        {
            let mut acc =
                BoundsAccumulator::new(&mut length, &mut mins, &mut maxs, 1000);

            for i in 0..700 {
                let p = vec3(i as f32, -(i as f32) * 0.5, (i % 7) as f32);

                assert!(acc.push(p, p + Vec3::ONE));
            }
        }

        assert_eq!(700, length);

        let min = reduce::<REDUCE_MIN>(&mut mins, length, 1000, u32::MAX);
        let max = reduce::<REDUCE_MAX>(&mut maxs, length, 1000, u32::MAX);

        assert_eq!(vec3(0.0, -349.5, 0.0), min.xyz());
        assert_eq!(vec3(700.0, 1.0, 7.0), max.xyz());
    }

    #[test]
    fn overflowing_entries_are_dropped() {
        let mut length = 0;
        let mut mins = vec![Vec4::ZERO; 2];
        let mut maxs = vec![Vec4::ZERO; 2];

        let mut acc =
            BoundsAccumulator::new(&mut length, &mut mins, &mut maxs, 2);

        assert!(acc.push(Vec3::ZERO, Vec3::ONE));
        assert!(acc.push(Vec3::ZERO, Vec3::ONE));
        assert!(!acc.push(Vec3::ZERO, Vec3::ONE));

        drop(acc);

        let min = reduce::<REDUCE_MIN>(&mut mins, length, 2, u32::MAX);

        assert_eq!(3, length);
        assert_eq!(Vec3::ZERO, min.xyz());
    }

    #[test]
    fn host_slot() {
        let mut mins = vec![
            vec3(1.0, 1.0, 1.0).extend(0.0),
            Vec4::ZERO,
            vec3(-5.0, 2.0, 3.0).extend(0.0),
        ];

        let min = reduce::<REDUCE_MIN>(&mut mins, 1, 2, 2);

        assert_eq!(vec3(-5.0, 1.0, 1.0), min.xyz());

        // With nothing appended, only the host entry counts
        let min = reduce::<REDUCE_MIN>(&mut mins, 0, 2, 2);

        assert_eq!(vec3(-5.0, 2.0, 3.0), min.xyz());
    }

    #[test]
    fn empty_reduction_is_inverted() {
        let mut mins = vec![Vec4::ZERO; 4];
        let mut maxs = vec![Vec4::ZERO; 4];

        let min = reduce::<REDUCE_MIN>(&mut mins, 0, 4, u32::MAX);
        let max = reduce::<REDUCE_MAX>(&mut maxs, 0, 4, u32::MAX);

        assert!(!min.xyz().cmple(max.xyz()).all());
    }

    #[test]
    fn request_location() {
        const N: usize = 64;

        let mut length = 0;
        let mut mins = vec![Vec4::ZERO; 8];
        let mut maxs = vec![Vec4::ZERO; 8];
        let mut scratch = LocationScratch::<N>::default();

        for lane in 0..N as u32 {
            // Second wave is entirely inactive
            stage_location(
                &mut scratch,
                lane,
                vec3(lane as f32, 0.0, 0.0),
                lane < 32,
            );
        }

        {
            let mut acc =
                BoundsAccumulator::new(&mut length, &mut mins, &mut maxs, 8);

            for lane in 0..N as u32 {
                flush_locations(&scratch, lane, &mut acc);
            }
        }

        assert_eq!(1, length);
        assert_eq!(Vec3::ZERO, mins[0].xyz());
        assert_eq!(vec3(31.0, 0.0, 0.0), maxs[0].xyz());
    }
}
