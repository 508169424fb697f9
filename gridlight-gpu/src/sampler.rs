mod build;
mod query;
mod storage;
mod variant;

pub use self::build::*;
pub use self::query::*;
pub use self::storage::*;
pub use self::variant::*;
