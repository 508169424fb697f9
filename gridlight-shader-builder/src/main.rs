use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use spirv_builder::{MetadataPrintout, SpirvBuilder};

/// Compiles `gridlight-shaders` into SPIR-V, writing each entry point into
/// `<out-dir>/<shader-id>.spv`, where it can be picked up by
/// `gridlight::Shaders::load()`.
fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or("usage: gridlight-shader-builder <out-dir>")?;

    let crate_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .ok_or("couldn't find workspace root")?
        .join("gridlight-shaders");

    let result = SpirvBuilder::new(crate_path, "spirv-unknown-vulkan1.1")
        .multimodule(true)
        .print_metadata(MetadataPrintout::None)
        .extra_arg("--spirt-passes=reduce,fuse_selects")
        .build()?;

    fs::create_dir_all(&out_dir)?;

    for (shader_name, shader_path) in result.module.unwrap_multi() {
        let shader_id = shader_name.replace("::", "_");
        let shader_id = shader_id.strip_suffix("_main").unwrap_or(&shader_id);
        let target = out_dir.join(format!("{shader_id}.spv"));

        fs::copy(shader_path, &target)?;

        println!("{} -> {}", shader_name, target.display());
    }

    Ok(())
}
