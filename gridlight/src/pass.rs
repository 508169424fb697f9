use std::marker::PhantomData;
use std::mem;
use std::ops::Range;

use bytemuck::Pod;
use glam::UVec3;
use log::debug;

use crate::{BindGroup, BindGroupBuilder, Bindable};

#[derive(Debug)]
pub struct ComputePass<P> {
    label: String,
    bind_groups: Vec<BindGroup>,
    pipeline: wgpu::ComputePipeline,
    _params: PhantomData<P>,
}

impl<P> ComputePass<P>
where
    P: Pod,
{
    pub fn builder<'a>(label: impl ToString) -> ComputePassBuilder<'a, P> {
        ComputePassBuilder {
            label: label.to_string(),
            bind_groups: Default::default(),
            _params: Default::default(),
        }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        size: UVec3,
        params: P,
    ) {
        let mut pass = self.begin(encoder, params);

        pass.dispatch_workgroups(size.x, size.y, size.z);
    }

    /// Runs the pass with workgroup counts read from given buffer, which must
    /// contain a `DispatchCommand`.
    pub fn run_indirect(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        indirect_buffer: &wgpu::Buffer,
        params: P,
    ) {
        let mut pass = self.begin(encoder, params);

        pass.dispatch_workgroups_indirect(indirect_buffer, 0);
    }

    fn begin<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        params: P,
    ) -> wgpu::ComputePass<'a> {
        let label = format!("gridlight_{}_pass", self.label);

        let mut pass =
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&label),
                timestamp_writes: None,
            });

        pass.set_pipeline(&self.pipeline);

        if mem::size_of::<P>() > 0 {
            pass.set_push_constants(0, bytemuck::bytes_of(&params));
        }

        for (bind_group_idx, bind_group) in self.bind_groups.iter().enumerate()
        {
            pass.set_bind_group(bind_group_idx as u32, bind_group.get(), &[]);
        }

        pass
    }
}

pub struct ComputePassBuilder<'a, P> {
    label: String,
    bind_groups: Vec<BindGroupBuilder<'a>>,
    _params: PhantomData<P>,
}

impl<'a, P> ComputePassBuilder<'a, P>
where
    P: Pod,
{
    pub fn bind<const N: usize>(
        mut self,
        items: [&'a dyn Bindable; N],
    ) -> Self {
        let mut bind_group = BindGroup::builder(format!(
            "{}_bg{}",
            self.label,
            self.bind_groups.len()
        ));

        for item in items {
            bind_group = bind_group.add(item);
        }

        self.bind_groups.push(bind_group);
        self
    }

    pub fn build(
        self,
        device: &wgpu::Device,
        module: &wgpu::ShaderModule,
        entry_point: &str,
    ) -> ComputePass<P> {
        debug!("Initializing pass: {}:{}", self.label, entry_point);

        let bind_groups: Vec<_> = self
            .bind_groups
            .into_iter()
            .map(|bg| bg.build(device))
            .collect();

        let bind_group_layouts: Vec<_> =
            bind_groups.iter().map(|bg| bg.layout()).collect();

        let push_constant_ranges = if mem::size_of::<P>() > 0 {
            vec![wgpu::PushConstantRange {
                stages: wgpu::ShaderStages::COMPUTE,
                range: Range {
                    start: 0,
                    end: mem::size_of::<P>() as u32,
                },
            }]
        } else {
            vec![]
        };

        let pipeline_layout_label =
            format!("gridlight_{}_pipeline_layout", self.label);

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&pipeline_layout_label),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &push_constant_ranges,
            });

        let pipeline_label = format!("gridlight_{}_pipeline", self.label);

        let pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&pipeline_label),
                layout: Some(&pipeline_layout),
                module,
                entry_point,
                compilation_options: Default::default(),
                cache: None,
            });

        ComputePass {
            label: self.label,
            bind_groups,
            pipeline,
            _params: PhantomData,
        }
    }
}
