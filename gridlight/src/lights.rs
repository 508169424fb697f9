use std::collections::hash_map::Entry;
use std::hash::Hash;

use derivative::Derivative;
use fxhash::FxHashMap;

use crate::{gpu, Bindable, BufferFlushOutcome, Light, MappedStorageBuffer};

/// Lights the grid gets built from, indexed by caller-provided handles.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Lights<H>
where
    H: Eq + Hash,
{
    buffer: MappedStorageBuffer<Vec<gpu::Light>>,

    #[derivative(Debug = "ignore")]
    index: FxHashMap<H, gpu::LightId>,
}

impl<H> Lights<H>
where
    H: Eq + Hash,
{
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            buffer: MappedStorageBuffer::new_default(
                device,
                "gridlight_lights",
            ),
            index: Default::default(),
        }
    }

    /// Adds a light, or updates it if given handle is already known.
    pub fn add(&mut self, light_handle: H, light: Light) {
        let light = light.serialize();

        match self.index.entry(light_handle) {
            Entry::Occupied(entry) => {
                let light_id = *entry.get();

                self.buffer[light_id.get() as usize] = light;
            }

            Entry::Vacant(entry) => {
                let light_id = gpu::LightId::new(self.buffer.len() as u32);

                self.buffer.push(light);
                entry.insert(light_id);
            }
        }
    }

    /// Removes a light; ids of lights added after it get shifted down by one.
    pub fn remove(&mut self, light_handle: &H) {
        let Some(light_id) = self.index.remove(light_handle) else {
            return;
        };

        self.buffer.remove(light_id.get() as usize);

        for light_id2 in self.index.values_mut() {
            if light_id2.get() > light_id.get() {
                *light_id2 = gpu::LightId::new(light_id2.get() - 1);
            }
        }
    }

    /// Returns the id shaders know given light under.
    pub fn id(&self, light_handle: &H) -> Option<gpu::LightId> {
        self.index.get(light_handle).copied()
    }

    pub fn get(&self, light_id: gpu::LightId) -> Option<&gpu::Light> {
        self.buffer.get(light_id.get() as usize)
    }

    pub fn len(&self) -> u32 {
        self.buffer.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn flush(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> BufferFlushOutcome {
        self.buffer.flush(device, queue)
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        self.buffer.bind_readable()
    }
}
