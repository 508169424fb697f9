use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use fxhash::FxHashMap;
use log::{debug, info};

use crate::{gpu, Error, Result};

/// SPIR-V modules produced by `gridlight-shader-builder`.
///
/// Fixed kernels are loaded up front, while the grid-build kernels (one per
/// build variant) get loaded when the variant is first used.
#[derive(Debug)]
pub struct Shaders {
    dir: PathBuf,
    pub(crate) bounds_reduce_min: wgpu::ShaderModule,
    pub(crate) bounds_reduce_max: wgpu::ShaderModule,
    pub(crate) calculate_bounds: wgpu::ShaderModule,
    grid_build: FxHashMap<u32, wgpu::ShaderModule>,
}

impl Shaders {
    pub const BOUNDS_REDUCE_MIN: &'static str = "bounds_reduce::min";
    pub const BOUNDS_REDUCE_MAX: &'static str = "bounds_reduce::max";
    pub const CALCULATE_BOUNDS: &'static str = "calculate_bounds::main";

    pub fn load(device: &wgpu::Device, dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_owned();

        info!("Loading shaders from `{}`", dir.display());

        Ok(Self {
            bounds_reduce_min: Self::load_module(
                device,
                &dir,
                Self::BOUNDS_REDUCE_MIN,
            )?,
            bounds_reduce_max: Self::load_module(
                device,
                &dir,
                Self::BOUNDS_REDUCE_MAX,
            )?,
            calculate_bounds: Self::load_module(
                device,
                &dir,
                Self::CALCULATE_BOUNDS,
            )?,
            grid_build: Default::default(),
            dir,
        })
    }

    /// Returns the build kernel for given variant, along with its entry
    /// point.
    pub(crate) fn grid_build(
        &mut self,
        device: &wgpu::Device,
        variant: gpu::GridVariant,
    ) -> Result<(&wgpu::ShaderModule, String)> {
        let entry_point = Self::grid_build_entry_point(variant);

        let module = match self.grid_build.entry(variant.build_key()) {
            Entry::Occupied(entry) => entry.into_mut(),

            Entry::Vacant(entry) => entry.insert(Self::load_module(
                device,
                &self.dir,
                &entry_point,
            )?),
        };

        Ok((module, entry_point))
    }

    pub fn grid_build_entry_point(variant: gpu::GridVariant) -> String {
        format!("grid_build::main_{}", variant.build_key())
    }

    /// Returns the file name `gridlight-shader-builder` stores given entry
    /// point under.
    pub fn file_name(entry_point: &str) -> String {
        let shader_id = entry_point.replace("::", "_");
        let shader_id = shader_id.strip_suffix("_main").unwrap_or(&shader_id);

        format!("{shader_id}.spv")
    }

    fn load_module(
        device: &wgpu::Device,
        dir: &Path,
        entry_point: &str,
    ) -> Result<wgpu::ShaderModule> {
        let path = dir.join(Self::file_name(entry_point));

        debug!("Loading shader `{}`", path.display());

        let bytes = fs::read(&path).map_err(|source| Error::ShaderNotReadable {
            path: path.clone(),
            source,
        })?;

        if !Self::is_spirv(&bytes) {
            return Err(Error::ShaderNotSpirv { path });
        }

        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(entry_point),
            source: wgpu::util::make_spirv(&bytes),
        }))
    }

    fn is_spirv(bytes: &[u8]) -> bool {
        const MAGIC: u32 = 0x0723_0203;

        bytes.len() >= 4
            && bytes.len() % 4 == 0
            && u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
                == MAGIC
    }
}
