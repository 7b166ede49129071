mod collection;
mod error;
mod hash;
mod traits;

pub mod filename;
pub mod filesystem;
pub mod mime;

pub use collection::FileCollection;
pub use error::StorageError;
pub use hash::ContentHash;
pub use traits::{BoxReader, MediaStore, SpooledFile};
