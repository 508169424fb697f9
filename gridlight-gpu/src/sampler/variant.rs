/// Strategy used to combine a cell's reservoirs into a single light at query
/// time.
#[repr(u32)]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, Hash))]
pub enum MergePolicy {
    /// Picks one of the cell's reservoirs uniformly; cheapest, noisiest.
    RandomSelect = 0,

    /// Merges all of the cell's reservoirs, weighting them by their stream
    /// totals.
    #[default]
    WithoutReplacement = 1,

    /// Re-weights the cell's lights with the caller's target function
    /// (resampled importance sampling); requires reservoirs to store
    /// `total weight / selected weight` ratios instead of pairs.
    WithReplacement = 2,
}

impl MergePolicy {
    pub const fn from_bits(bits: u32) -> Self {
        match bits {
            0 => Self::RandomSelect,
            2 => Self::WithReplacement,
            _ => Self::WithoutReplacement,
        }
    }
}

/// Compile-time flavor of the grid: determines how reservoirs are laid out,
/// built and merged.
///
/// Each distinct variant corresponds to a separate shader entry point, so
/// changing it requires recreating the pipelines that read or write the
/// grid.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, Hash))]
pub struct GridVariant(u32);

impl GridVariant {
    /// Splits each cell into 8 direction buckets, selected by the signs of
    /// the query's normal.
    pub const OCTAHEDRAL: u32 = 1 << 0;

    /// Builds each reservoir with an entire workgroup instead of a single
    /// invocation.
    pub const PARALLEL_BUILD: u32 = 1 << 1;

    /// Scores lights against cell centers instead of entire cells.
    pub const CENTROID_BUILD: u32 = 1 << 2;

    /// Collapses the parallel build in two levels (per-wave leaders first);
    /// without it, lane 0 collapses all lanes alone.
    pub const WAVE_COLLAPSE: u32 = 1 << 3;

    const MERGE_POLICY_SHIFT: u32 = 4;
    const MERGE_POLICY_MASK: u32 = 0b11 << Self::MERGE_POLICY_SHIFT;
    const FLAGS_MASK: u32 = 0b1111;

    pub const fn new(merge_policy: MergePolicy) -> Self {
        Self((merge_policy as u32) << Self::MERGE_POLICY_SHIFT)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn with(self, flag: u32, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | flag)
        } else {
            Self(self.0 & !flag)
        }
    }

    pub const fn has(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub const fn is_octahedral(self) -> bool {
        self.has(Self::OCTAHEDRAL)
    }

    pub const fn is_parallel(self) -> bool {
        self.has(Self::PARALLEL_BUILD)
    }

    pub const fn is_centroid(self) -> bool {
        self.has(Self::CENTROID_BUILD)
    }

    pub const fn is_wave_collapse(self) -> bool {
        self.has(Self::WAVE_COLLAPSE)
    }

    pub const fn merge_policy(self) -> MergePolicy {
        MergePolicy::from_bits(
            (self.0 & Self::MERGE_POLICY_MASK) >> Self::MERGE_POLICY_SHIFT,
        )
    }

    /// Returns number of direction buckets per cell.
    pub const fn faces(self) -> u32 {
        if self.is_octahedral() {
            8
        } else {
            1
        }
    }

    /// Returns whether reservoirs store a single `total / selected` ratio
    /// instead of a `(selected, total)` weight pair.
    pub const fn stores_ratio(self) -> bool {
        matches!(self.merge_policy(), MergePolicy::WithReplacement)
    }

    /// Returns number of floats each reservoir occupies in the weights
    /// buffer.
    pub const fn weights_stride(self) -> u32 {
        if self.stores_ratio() {
            1
        } else {
            2
        }
    }

    /// Returns the part of this variant that affects the build kernel, used
    /// to pick its entry point.
    pub const fn build_key(self) -> u32 {
        let key = self.0 & Self::FLAGS_MASK;

        if self.stores_ratio() {
            key | (1 << Self::MERGE_POLICY_SHIFT)
        } else {
            key
        }
    }

    /// Inverse of [`Self::build_key()`]; merge policy is recovered only as
    /// far as the storage layout is concerned.
    pub const fn from_build_key(key: u32) -> Self {
        let policy = if key & (1 << Self::MERGE_POLICY_SHIFT) != 0 {
            MergePolicy::WithReplacement
        } else {
            MergePolicy::WithoutReplacement
        };

        Self(Self::new(policy).0 | (key & Self::FLAGS_MASK))
    }

    /// Returns the part of this variant that affects code reading the grid.
    pub const fn query_key(self) -> u32 {
        self.0 & (Self::OCTAHEDRAL | Self::MERGE_POLICY_MASK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        let variant = GridVariant::new(MergePolicy::RandomSelect)
            .with(GridVariant::OCTAHEDRAL, true)
            .with(GridVariant::PARALLEL_BUILD, true)
            .with(GridVariant::PARALLEL_BUILD, false);

        assert!(variant.is_octahedral());
        assert!(!variant.is_parallel());
        assert_eq!(MergePolicy::RandomSelect, variant.merge_policy());
        assert_eq!(8, variant.faces());
        assert_eq!(2, variant.weights_stride());
    }

    #[test]
    fn build_key() {
        for policy in [
            MergePolicy::RandomSelect,
            MergePolicy::WithoutReplacement,
            MergePolicy::WithReplacement,
        ] {
            let variant = GridVariant::new(policy)
                .with(GridVariant::PARALLEL_BUILD, true)
                .with(GridVariant::CENTROID_BUILD, true);

            let rebuilt = GridVariant::from_build_key(variant.build_key());

            assert_eq!(variant.stores_ratio(), rebuilt.stores_ratio());
            assert!(rebuilt.is_parallel());
            assert!(rebuilt.is_centroid());
            assert!(!rebuilt.is_octahedral());
        }

        // Random-select and without-replacement share the same storage, so
        // they share the build kernel too
        assert_eq!(
            GridVariant::new(MergePolicy::RandomSelect).build_key(),
            GridVariant::new(MergePolicy::WithoutReplacement).build_key(),
        );
    }

    #[test]
    fn query_key() {
        let a = GridVariant::new(MergePolicy::WithReplacement);
        let b = a.with(GridVariant::PARALLEL_BUILD, true);

        assert_eq!(a.query_key(), b.query_key());
        assert_ne!(
            a.query_key(),
            a.with(GridVariant::OCTAHEDRAL, true).query_key()
        );
    }
}
