use spirv_std::arch::IndexUnchecked;

use crate::{Light, LightId};

#[derive(Clone, Copy)]
pub struct LightsView<'a> {
    items: &'a [Light],
    len: u32,
}

impl<'a> LightsView<'a> {
    /// Creates a view over the first `len` lights of given buffer.
    ///
    /// Buffers are usually over-allocated, so `len` comes separately (e.g.
    /// from push constants) instead of being derived from the slice.
    pub fn new(items: &'a [Light], len: u32) -> Self {
        Self { items, len }
    }

    pub fn get(&self, id: LightId) -> Light {
        unsafe { *self.items.index_unchecked(id.get() as usize) }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
