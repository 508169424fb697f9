use bytemuck::{Pod, Zeroable};
use glam::{uvec3, UVec3, UVec4, Vec3, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::LightRegion;

/// Geometry of the light-sampler grid; computed on the GPU from the
/// aggregated scene bounds and then read by both the builder and consumers.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GridConfig {
    /// xyz - number of cells along each axis
    /// w - number of reservoirs per cell (and per face, if octahedral)
    pub num_cells: UVec4,

    /// xyz - size of a single cell
    pub cell_size: Vec4,

    /// xyz - minimum corner of the grid
    pub scene_min: Vec4,

    /// xyz - extent of the grid, equal to `cell_size * num_cells`
    pub scene_extent: Vec4,
}

impl GridConfig {
    /// Smallest extent a grid axis can have; degenerate bounds (e.g. a single
    /// point, or a flat plane) get inflated up to this size.
    pub const MIN_EXTENT: f32 = 1.0e-3;

    /// Sizes the grid so that cells are (close to) cubic, with the longest
    /// axis of given bounds getting `max_cells_per_axis` cells.
    pub fn from_bounds(
        min: Vec3,
        max: Vec3,
        max_cells_per_axis: u32,
        reservoirs_per_cell: u32,
    ) -> Self {
        let max_cells = max_cells_per_axis.max(1);
        let extent = (max - min).max(Vec3::ZERO);

        let cubic_size = (extent.max_element() / (max_cells as f32))
            .max(Self::MIN_EXTENT);

        let mut scene_min = min;
        let mut scene_extent = extent;

        // Axes thinner than a single cell get centered around their original
        // position and inflated to a cubic cell
        if extent.x < cubic_size {
            scene_min.x -= (cubic_size - extent.x) * 0.5;
            scene_extent.x = cubic_size;
        }

        if extent.y < cubic_size {
            scene_min.y -= (cubic_size - extent.y) * 0.5;
            scene_extent.y = cubic_size;
        }

        if extent.z < cubic_size {
            scene_min.z -= (cubic_size - extent.z) * 0.5;
            scene_extent.z = cubic_size;
        }

        let num_cells = (scene_extent / cubic_size)
            .ceil()
            .as_uvec3()
            .clamp(UVec3::ONE, UVec3::splat(max_cells));

        let cell_size = scene_extent / num_cells.as_vec3();

        Self {
            num_cells: num_cells.extend(reservoirs_per_cell),
            cell_size: cell_size.extend(0.0),
            scene_min: scene_min.extend(0.0),
            scene_extent: scene_extent.extend(0.0),
        }
    }

    /// Resizes the grid to cover given bounds.
    ///
    /// Inverted bounds (i.e. nobody registered any bounds this frame) keep
    /// the previous geometry, updating just the number of reservoirs.
    pub fn resize(
        &mut self,
        min: Vec3,
        max: Vec3,
        max_cells_per_axis: u32,
        reservoirs_per_cell: u32,
    ) {
        if min.cmple(max).all() {
            *self = Self::from_bounds(
                min,
                max,
                max_cells_per_axis,
                reservoirs_per_cell,
            );
        } else {
            self.num_cells.w = reservoirs_per_cell;
        }
    }

    /// Returns whether this grid has been sized yet; a zeroed config (e.g. a
    /// freshly allocated buffer) is invalid.
    pub fn is_valid(&self) -> bool {
        self.num_cells.x > 0
            && self.num_cells.y > 0
            && self.num_cells.z > 0
            && self.num_cells.w > 0
            && self.cell_size.x > 0.0
            && self.cell_size.y > 0.0
            && self.cell_size.z > 0.0
    }

    pub fn cells(&self) -> UVec3 {
        self.num_cells.xyz()
    }

    pub fn cell_count(&self) -> u32 {
        self.num_cells.x * self.num_cells.y * self.num_cells.z
    }

    pub fn reservoirs_per_cell(&self) -> u32 {
        self.num_cells.w
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size.xyz()
    }

    pub fn scene_min(&self) -> Vec3 {
        self.scene_min.xyz()
    }

    pub fn scene_max(&self) -> Vec3 {
        self.scene_min.xyz() + self.scene_extent.xyz()
    }

    /// Returns the cell containing given point, or [`GridCell::NONE`] if the
    /// point lies outside of the grid.
    pub fn cell_at(&self, point: Vec3) -> GridCell {
        let rel = (point - self.scene_min()) / self.cell_size();
        let cells = self.cells().as_vec3();

        if rel.x < 0.0
            || rel.y < 0.0
            || rel.z < 0.0
            || rel.x > cells.x
            || rel.y > cells.y
            || rel.z > cells.z
        {
            return GridCell::NONE;
        }

        // Points lying exactly on the grid's upper boundary belong to the
        // last cell
        self.cell(rel.floor().as_uvec3().min(self.cells() - UVec3::ONE))
    }

    /// Returns the cell containing given point, clamping points outside of
    /// the grid to its closest cell.
    pub fn cell_at_clamped(&self, point: Vec3) -> GridCell {
        let rel = ((point - self.scene_min()) / self.cell_size())
            .floor()
            .max(Vec3::ZERO);

        self.cell(rel.as_uvec3().min(self.cells() - UVec3::ONE))
    }

    pub fn cell(&self, coord: UVec3) -> GridCell {
        GridCell {
            coord,
            index: (coord.z * self.num_cells.y + coord.y) * self.num_cells.x
                + coord.x,
        }
    }

    /// Inverse of the flattening done by [`Self::cell()`].
    pub fn cell_from_index(&self, index: u32) -> GridCell {
        let x = index % self.num_cells.x;
        let y = (index / self.num_cells.x) % self.num_cells.y;
        let z = index / (self.num_cells.x * self.num_cells.y);

        GridCell {
            coord: uvec3(x, y, z),
            index,
        }
    }

    pub fn cell_region(&self, cell: GridCell) -> LightRegion {
        let min = self.scene_min() + cell.coord.as_vec3() * self.cell_size();

        LightRegion::new(min, min + self.cell_size())
    }

    /// Returns index of the first reservoir slot of given cell (and face, if
    /// `faces` is 8).
    pub fn first_slot(&self, cell: GridCell, faces: u32, face: u32) -> u32 {
        (cell.index * faces + face) * self.reservoirs_per_cell()
    }

    /// Returns the total number of reservoir slots in this grid.
    pub fn slot_count(&self, faces: u32) -> u32 {
        self.cell_count() * faces * self.reservoirs_per_cell()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GridCell {
    pub coord: UVec3,

    /// Flattened index, with x varying fastest.
    pub index: u32,
}

impl GridCell {
    pub const NONE: Self = Self {
        coord: UVec3::ZERO,
        index: u32::MAX,
    };

    pub fn is_some(self) -> bool {
        self.index != u32::MAX
    }

    pub fn is_none(self) -> bool {
        !self.is_some()
    }
}

/// One of eight direction buckets, determined by the signs of a normal's
/// components.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct OctahedralFace(u32);

impl OctahedralFace {
    pub const COUNT: u32 = 8;

    pub fn new(face: u32) -> Self {
        Self(face & 7)
    }

    pub fn from_normal(normal: Vec3) -> Self {
        let mut face = 0;

        if normal.x < 0.0 {
            face |= 1;
        }

        if normal.y < 0.0 {
            face |= 2;
        }

        if normal.z < 0.0 {
            face |= 4;
        }

        Self(face)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns the unit vector pointing into the middle of this face's
    /// octant.
    pub fn direction(self) -> Vec3 {
        let sign = |bit: u32| {
            if self.0 & bit == 0 {
                1.0
            } else {
                -1.0
            }
        };

        Vec3::new(sign(1), sign(2), sign(4)) * (1.0 / 3.0f32.sqrt())
    }
}
