use log::info;

use super::{pad_size, storage_buffer_layout, Bindable};

/// Storage buffer that exists only in VRAM.
///
/// This kind of storage buffer should be used for data structures that don't
/// have to be accessed on the host machine, e.g. the grid's reservoirs.
#[derive(Debug)]
pub struct UnmappedStorageBuffer {
    buffer: wgpu::Buffer,
}

impl UnmappedStorageBuffer {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
    ) -> Self {
        Self::new_ex(device, label, size, wgpu::BufferUsages::empty())
    }

    /// Creates a buffer that can additionally serve as the source of
    /// indirect dispatches.
    pub fn new_indirect(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
    ) -> Self {
        Self::new_ex(device, label, size, wgpu::BufferUsages::INDIRECT)
    }

    fn new_ex(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let label = label.as_ref();
        let size = pad_size(size);

        info!("Allocating unmapped storage buffer `{label}`; size={size}");

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC
                | usage,
            size: size as _,
            mapped_at_creation: false,
        });

        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn size(&self) -> usize {
        self.buffer.size() as usize
    }

    pub fn as_ro_bind(&self) -> UnmappedStorageBufferBinder<'_> {
        UnmappedStorageBufferBinder {
            parent: self,
            read_only: true,
        }
    }

    pub fn as_rw_bind(&self) -> UnmappedStorageBufferBinder<'_> {
        UnmappedStorageBufferBinder {
            parent: self,
            read_only: false,
        }
    }
}

pub struct UnmappedStorageBufferBinder<'a> {
    parent: &'a UnmappedStorageBuffer,
    read_only: bool,
}

impl Bindable for UnmappedStorageBufferBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = storage_buffer_layout(binding, self.read_only);
        let resource = self.parent.buffer.as_entire_binding();

        vec![(layout, resource)]
    }
}

/// Binds multiple buffers at consecutive bindings.
pub struct UnmappedStorageBuffersBinder<'a, const N: usize> {
    pub(crate) items: [UnmappedStorageBufferBinder<'a>; N],
}

impl<const N: usize> Bindable for UnmappedStorageBuffersBinder<'_, N> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        self.items
            .iter()
            .enumerate()
            .flat_map(|(idx, item)| item.bind(binding + idx as u32))
            .collect()
    }
}
