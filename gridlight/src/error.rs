use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't read shader `{path}`")]
    ShaderNotReadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("shader `{path}` is not a SPIR-V module")]
    ShaderNotSpirv { path: PathBuf },

    #[error(
        "light sampler grid needs a {size}-byte buffer, but the device \
         supports at most {limit} bytes per storage binding; lower the number \
         of cells or lights per cell"
    )]
    GridTooLarge { size: u64, limit: u64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
