use crate::Bindable;

#[derive(Debug)]
pub struct BindGroup {
    bind_group: wgpu::BindGroup,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl BindGroup {
    pub fn builder<'ctx>(label: impl ToString) -> BindGroupBuilder<'ctx> {
        BindGroupBuilder {
            label: label.to_string(),
            layouts: Default::default(),
            resources: Default::default(),
        }
    }

    pub fn get(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }
}

pub struct BindGroupBuilder<'a> {
    label: String,
    layouts: Vec<wgpu::BindGroupLayoutEntry>,
    resources: Vec<wgpu::BindingResource<'a>>,
}

impl<'a> BindGroupBuilder<'a> {
    pub fn add(mut self, item: &'a dyn Bindable) -> Self {
        for (layout, resource) in item.bind(self.resources.len() as u32) {
            self.layouts.push(layout);
            self.resources.push(resource);
        }

        self
    }

    pub fn build(self, device: &wgpu::Device) -> BindGroup {
        let label = format!("gridlight_{}", self.label);

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label}_layout")),
                entries: &self.layouts,
            });

        let entries: Vec<_> = self
            .resources
            .into_iter()
            .enumerate()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: binding as _,
                resource,
            })
            .collect();

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&label),
            layout: &bind_group_layout,
            entries: &entries,
        });

        BindGroup {
            bind_group,
            bind_group_layout,
        }
    }
}
