use std::ops::{Deref, DerefMut};
use std::{any, mem};

use bytemuck::Pod;
use log::info;

use super::{pad_size, storage_buffer_layout, Bindable};

/// Storage buffer that exists both on the host machine and the GPU.
///
/// This kind of storage buffer should be used for data that's prepared on
/// the host machine and then read by shaders (e.g. lights); it's allocated
/// both in RAM and VRAM, and uses [`DerefMut`] to track whether it's been
/// modified since the last flush.
#[derive(Debug)]
pub struct MappedStorageBuffer<T> {
    label: String,
    buffer: wgpu::Buffer,
    data: T,
    dirty: bool,
}

impl<T> MappedStorageBuffer<T>
where
    T: StorageBufferable,
{
    pub fn new(device: &wgpu::Device, label: impl AsRef<str>, data: T) -> Self {
        let label = label.as_ref();
        let buffer = Self::allocate(device, label, data.data().len());

        Self {
            label: label.to_owned(),
            buffer,
            data,
            dirty: true,
        }
    }

    pub fn new_default(device: &wgpu::Device, label: impl AsRef<str>) -> Self
    where
        T: Default,
    {
        Self::new(device, label, Default::default())
    }

    fn allocate(
        device: &wgpu::Device,
        label: &str,
        size: usize,
    ) -> wgpu::Buffer {
        let size = Self::allocation_size(size);

        info!(
            "Allocating storage buffer `{label}`; ty={}, size={size}",
            any::type_name::<T>(),
        );

        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::STORAGE,
            size: size as _,
            mapped_at_creation: false,
        })
    }

    /// Returns the number of bytes allocated for `size` bytes of data; never
    /// less than a single item, since shaders can't bind an array buffer
    /// smaller than its stride.
    fn allocation_size(size: usize) -> usize {
        pad_size(size.max(T::MIN_SIZE))
    }

    /// Uploads data to the GPU, if it's been modified; reallocates the buffer
    /// if data doesn't fit in it anymore.
    pub fn flush(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> BufferFlushOutcome {
        if !mem::take(&mut self.dirty) {
            return BufferFlushOutcome::Unchanged;
        }

        let data = self.data.data();

        let outcome = if (data.len() as u64) > self.buffer.size() {
            // Leave some headroom, so that adding lights one by one doesn't
            // reallocate the buffer each time
            self.buffer = Self::allocate(device, &self.label, 2 * data.len());

            BufferFlushOutcome::Reallocated
        } else {
            BufferFlushOutcome::Updated
        };

        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, data);
        }

        outcome
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        MappedStorageBufferBinder { parent: self }
    }
}

impl<T> Deref for MappedStorageBuffer<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for MappedStorageBuffer<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.dirty = true;

        &mut self.data
    }
}

pub struct MappedStorageBufferBinder<'a, T> {
    parent: &'a MappedStorageBuffer<T>,
}

impl<T> Bindable for MappedStorageBufferBinder<'_, T> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = storage_buffer_layout(binding, true);
        let resource = self.parent.buffer.as_entire_binding();

        vec![(layout, resource)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferFlushOutcome {
    Unchanged,
    Updated,

    /// Buffer has been reallocated, so all of the bind groups referring to
    /// it have to be recreated.
    Reallocated,
}

impl BufferFlushOutcome {
    pub fn is_reallocated(&self) -> bool {
        matches!(self, Self::Reallocated)
    }
}

pub trait StorageBufferable {
    /// Smallest size, in bytes, a buffer holding this data can be bound with.
    const MIN_SIZE: usize;

    fn data(&self) -> &[u8];
}

impl<T> StorageBufferable for Vec<T>
where
    T: Pod,
{
    const MIN_SIZE: usize = mem::size_of::<T>();

    fn data(&self) -> &[u8] {
        bytemuck::cast_slice(self)
    }
}
