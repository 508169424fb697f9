use bytemuck::{Pod, Zeroable};
use glam::UVec3;

use crate::{GridConfig, GridVariant, BUILD_THREADS};

/// Arguments of an indirect dispatch, laid out the way
/// `dispatch_workgroups_indirect()` expects them.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct DispatchCommand {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl DispatchCommand {
    /// Largest number of workgroups a single dimension of a dispatch can
    /// have.
    pub const MAX_GROUPS_PER_DIMENSION: u32 = 65535;

    /// Spreads given number of workgroups over two dimensions; the grid can
    /// get large enough not to fit within a single one.
    ///
    /// Since the groups might not divide evenly, the dispatch can contain a
    /// couple of excess workgroups, which kernels have to skip.
    pub fn new(groups: u32) -> Self {
        if groups == 0 {
            return Self { x: 0, y: 1, z: 1 };
        }

        let x = groups.min(Self::MAX_GROUPS_PER_DIMENSION);
        let y = ((groups + x - 1) / x).max(1);

        Self { x, y, z: 1 }
    }

    /// Sizes the dispatch of the grid-build kernel.
    pub fn for_grid(config: &GridConfig, variant: GridVariant) -> Self {
        if !config.is_valid() {
            return Self::new(0);
        }

        let slots = config.slot_count(variant.faces());

        if variant.is_parallel() {
            // One workgroup per slot
            Self::new(slots)
        } else {
            Self::new((slots + BUILD_THREADS - 1) / BUILD_THREADS)
        }
    }

    /// Returns flat index of given workgroup within a dispatch.
    pub fn flat_group(workgroup_id: UVec3, num_workgroups: UVec3) -> u32 {
        (workgroup_id.z * num_workgroups.y + workgroup_id.y) * num_workgroups.x
            + workgroup_id.x
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec3, Vec3};

    use super::*;

    fn group_count(cmd: DispatchCommand) -> u32 {
        cmd.x * cmd.y * cmd.z
    }

    #[test]
    fn new() {
        assert_eq!(
            DispatchCommand { x: 0, y: 1, z: 1 },
            DispatchCommand::new(0)
        );

        assert_eq!(
            DispatchCommand { x: 1, y: 1, z: 1 },
            DispatchCommand::new(1)
        );

        assert_eq!(
            DispatchCommand { x: 65535, y: 1, z: 1 },
            DispatchCommand::new(65535)
        );

        assert_eq!(
            DispatchCommand { x: 65535, y: 2, z: 1 },
            DispatchCommand::new(65536)
        );

        for groups in [1, 100, 65535, 65536, 200_000, 4_194_304] {
            let cmd = DispatchCommand::new(groups);

            assert!(cmd.x <= DispatchCommand::MAX_GROUPS_PER_DIMENSION);
            assert!(cmd.y <= DispatchCommand::MAX_GROUPS_PER_DIMENSION);
            assert!(group_count(cmd) >= groups);
            assert!(group_count(cmd) - groups < cmd.x);
        }
    }

    #[test]
    fn for_grid() {
        let config =
            GridConfig::from_bounds(Vec3::ZERO, Vec3::splat(16.0), 16, 64);

        // 16^3 cells * 64 reservoirs = 262144 slots
        let serial = GridVariant::default();

        assert_eq!(
            2048,
            group_count(DispatchCommand::for_grid(&config, serial))
        );

        let octahedral = serial.with(GridVariant::OCTAHEDRAL, true);

        assert_eq!(
            DispatchCommand { x: 16384, y: 1, z: 1 },
            DispatchCommand::for_grid(&config, octahedral)
        );

        let parallel = serial.with(GridVariant::PARALLEL_BUILD, true);

        assert_eq!(
            DispatchCommand { x: 65535, y: 5, z: 1 },
            DispatchCommand::for_grid(&config, parallel)
        );

        assert_eq!(
            DispatchCommand::new(0),
            DispatchCommand::for_grid(&GridConfig::default(), serial)
        );
    }

    #[test]
    fn flat_group() {
        let num = uvec3(65535, 5, 1);

        assert_eq!(0, DispatchCommand::flat_group(UVec3::ZERO, num));
        assert_eq!(65535 + 7, DispatchCommand::flat_group(uvec3(7, 1, 0), num));
    }
}
