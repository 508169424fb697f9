mod bind_group;
mod bindable;
mod mapped_storage_buffer;
mod unmapped_storage_buffer;

pub use self::bind_group::*;
pub use self::bindable::*;
pub use self::mapped_storage_buffer::*;
pub use self::unmapped_storage_buffer::*;

/// Pads given size so that it satisfies wgpu's requirements for buffer sizes
/// and copies.
pub(crate) fn pad_size(size: usize) -> usize {
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;

    size.max(align).next_multiple_of(align)
}
